//! Release Tracker - follows features as they propagate through a dependency
//! graph of repos.
//!
//! Features are merged into repos, repos publish versions, and the tracker
//! derives for every repo which features are merged, which are queued behind
//! an upstream release and which are only known upstream. The core is a pure
//! fold of [`events::ReleaseEvent`]s over [`state::TrackerState`]; the
//! [`tracker::Tracker`] wraps it in a compare-and-swap cycle against a
//! [`persistence::StateStore`].

pub mod config;
pub mod events;
pub mod persistence;
pub mod state;
pub mod status;
pub mod tracker;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{ConfigError, TrackerConfig};
pub use events::{ReleaseEvent, parse_event};
pub use state::{EventApplier, RepoGraph, TrackerState, apply_event};
pub use status::{RepoSnapshot, TrackerSummary};
pub use tracker::{Tracker, TrackerError};
