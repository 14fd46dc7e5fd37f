//! Core domain types for the release tracker.

pub mod ids;

pub use ids::{FeatureName, RepoName, SemverVersion, normalize_name};
