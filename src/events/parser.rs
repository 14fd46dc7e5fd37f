//! Event payload parser.
//!
//! Turns raw JSON into a validated [`ReleaseEvent`]. Everything is checked here,
//! before any state is loaded, so a rejected event never reaches the applier.
//!
//! # Accepted shapes
//!
//! ```text
//! {"event_type": "feature_merged", "repo": "core", "feature_name": "..."}
//! {"event_type": "versions_updated", "repo": "eval", "version": "5.7.2",
//!  "package_manifest": {"dependencies": {...}}}
//! {"event": { ...either of the above... }}
//! ```
//!
//! `package_json` is accepted in place of `package_manifest`.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::types::{ReleaseEvent, ValidationError};

/// The `event_type` tags this tracker handles.
pub const EVENT_TYPES: [&str; 2] = ["feature_merged", "versions_updated"];

/// Error type for event parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The payload is not valid JSON at all.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload is JSON but not a valid event.
    #[error("invalid event: {0}")]
    Invalid(#[from] ValidationError),
}

/// Parses raw payload bytes into a validated event.
pub fn parse_event(payload: &[u8]) -> Result<ReleaseEvent, ParseError> {
    let value: Value = serde_json::from_slice(payload)?;
    Ok(parse_event_value(&value)?)
}

/// Parses an already-decoded JSON value into a validated event.
///
/// Missing or mistyped fields surface as [`ValidationError::Malformed`] with
/// the decoder's message. Identifiers are trimmed; blank identifiers are
/// rejected.
pub fn parse_event_value(value: &Value) -> Result<ReleaseEvent, ValidationError> {
    let body = unwrap_envelope(value)?;
    let event = ReleaseEvent::deserialize(body).map_err(malformed)?;
    event.normalized()
}

/// Just enough of an event object to route it.
#[derive(Debug, Deserialize)]
struct RawEventType {
    event_type: Option<String>,
}

fn malformed(e: serde_json::Error) -> ValidationError {
    ValidationError::Malformed(e.to_string())
}

/// Accepts both a bare event and the `{"event": {...}}` request envelope,
/// returning the event object once its kind is known to be handled.
fn unwrap_envelope(value: &Value) -> Result<&Value, ValidationError> {
    let body = match value.get("event") {
        Some(inner) if value.get("event_type").is_none() => inner,
        _ => value,
    };
    if !body.is_object() {
        return Err(ValidationError::Malformed("event must be a JSON object".to_string()));
    }

    let header = RawEventType::deserialize(body).map_err(malformed)?;
    match header.event_type {
        None => Err(ValidationError::MissingField("event_type")),
        Some(kind) if EVENT_TYPES.contains(&kind.as_str()) => Ok(body),
        Some(kind) => Err(ValidationError::UnknownEventType(kind)),
    }
}
