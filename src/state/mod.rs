//! Pure state logic for the release tracker.
//!
//! This module contains the functional core: the repo graph, the bounded
//! feature lists, the aggregate state and the event transitions that move
//! features between lists. All I/O happens elsewhere.

pub mod graph;
pub mod ledger;
pub mod model;
pub mod transitions;
pub mod version;

// Re-export commonly used types and functions
pub use graph::{GraphError, GraphFileError, RepoGraph, RepoGraphNode, default_graph};
pub use ledger::{FeatureList, MAX_TRACKED_FEATURES};
pub use model::{MAX_RECORDED_VERSIONS, RepoState, RepoVersionState, TrackerState, VersionRecord};
pub use transitions::{DEFAULT_PACKAGE_SCOPE, EventApplier, apply_event};
pub use version::{compare_versions, latest_version};
