//! The tracker service: load, apply, save, with retry on save conflicts.

pub mod retry;
pub mod service;

use thiserror::Error;

use crate::events::{ParseError, ValidationError};
use crate::persistence::StoreError;

pub use retry::{RetryConfig, RetryOutcome, retry_with_backoff};
pub use service::Tracker;

/// Errors surfaced to tracker callers.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The payload could not be decoded.
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid event: {0}")]
    Invalid(#[from] ValidationError),

    #[error("state store error: {0}")]
    Store(#[from] StoreError),

    /// Every attempt lost the race to another writer.
    #[error("gave up after {attempts} attempts: state kept changing underneath")]
    ConflictRetriesExhausted { attempts: u32 },
}

impl TrackerError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, TrackerError::Store(e) if e.is_conflict())
    }
}
