//! Release pipeline events: typed representations and the JSON boundary
//! parser that validates them.

pub mod parser;
pub mod types;

pub use parser::{ParseError, parse_event, parse_event_value};
pub use types::{
    FeatureMergedEvent, PackageManifest, ReleaseEvent, ValidationError, VersionsUpdatedEvent,
};
