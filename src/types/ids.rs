//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of repo names, feature names and
//! version strings, which are all plain strings on the wire.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// A repository name, unique within the repo graph (e.g. `core`, `eval`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoName(pub String);

impl RepoName {
    pub fn new(s: impl Into<String>) -> Self {
        RepoName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the name reduced to lowercase ASCII alphanumerics.
    ///
    /// Used to match package names such as `@scope/schematic_viewer` against
    /// repo names such as `schematic-viewer`.
    pub fn normalized(&self) -> String {
        normalize_name(&self.0)
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RepoName {
    fn from(s: &str) -> Self {
        RepoName(s.to_string())
    }
}

impl From<String> for RepoName {
    fn from(s: String) -> Self {
        RepoName(s)
    }
}

impl Borrow<str> for RepoName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The name of a merged feature or fix.
///
/// Uniqueness is per list, not global: the same name can be merged in one
/// repo and upstream-only in another.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureName(pub String);

impl FeatureName {
    pub fn new(s: impl Into<String>) -> Self {
        FeatureName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FeatureName {
    fn from(s: &str) -> Self {
        FeatureName(s.to_string())
    }
}

impl From<String> for FeatureName {
    fn from(s: String) -> Self {
        FeatureName(s)
    }
}

/// A published version string such as `5.7.2`.
///
/// Opaque: only compared for equality, or ranked with the best-effort numeric
/// comparison in [`crate::state::version`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SemverVersion(pub String);

impl SemverVersion {
    pub fn new(s: impl Into<String>) -> Self {
        SemverVersion(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SemverVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SemverVersion {
    fn from(s: &str) -> Self {
        SemverVersion(s.to_string())
    }
}

/// Lowercases and strips everything but ASCII alphanumerics.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    mod repo_name {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn serializes_as_plain_string(s in "[a-z0-9./-]{1,30}") {
                let repo = RepoName::new(s.clone());
                let json = serde_json::to_string(&repo).unwrap();
                prop_assert_eq!(json, serde_json::to_string(&s).unwrap());
            }

            #[test]
            fn normalized_is_alphanumeric_lowercase(s in ".{0,40}") {
                let normalized = RepoName::new(s).normalized();
                prop_assert!(normalized.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
            }
        }

        #[test]
        fn normalized_strips_punctuation_and_case() {
            assert_eq!(RepoName::from("tscircuit.com").normalized(), "tscircuitcom");
            assert_eq!(RepoName::from("3D-Viewer").normalized(), "3dviewer");
        }

        #[test]
        fn display_is_bare_name() {
            assert_eq!(RepoName::from("core").to_string(), "core");
        }
    }

    #[test]
    fn feature_name_display() {
        assert_eq!(FeatureName::from("Ground Pours").to_string(), "Ground Pours");
    }

    #[test]
    fn version_deserializes_from_string() {
        let version: SemverVersion = serde_json::from_str("\"5.7.2\"").unwrap();
        assert_eq!(version.as_str(), "5.7.2");
    }
}
