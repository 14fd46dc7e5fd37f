//! Read-only views of tracker state.
//!
//! A snapshot is one row per repo with its current version and feature lists.
//! The summary adds the repo graph and the numerically latest recorded version
//! of each repo. Both are owned copies: mutating them never reaches the state
//! they were built from.

pub mod snapshot;
pub mod summary;

pub use snapshot::{RepoSnapshot, build_snapshot};
pub use summary::{TrackerSummary, build_summary};
