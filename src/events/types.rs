//! Release pipeline event types.
//!
//! Two things happen to a repo over time: a feature is merged into its
//! mainline, or it publishes a new version. Both arrive as JSON objects tagged
//! by `event_type`.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::types::{FeatureName, RepoName, SemverVersion};

/// Manifest sections whose keys are treated as dependency declarations.
pub const DEPENDENCY_SECTIONS: [&str; 4] = [
    "dependencies",
    "devDependencies",
    "optionalDependencies",
    "peerDependencies",
];

/// Reasons an event is rejected before it touches any state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The payload does not decode as an event: it is not an object, or a
    /// field is missing or has the wrong JSON type.
    #[error("malformed event: {0}")]
    Malformed(String),

    /// `event_type` is absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A required string field is empty after trimming.
    #[error("field {0} must not be empty")]
    EmptyField(&'static str),

    /// `event_type` names an event kind this tracker does not handle.
    #[error("unknown event type: {0}")]
    UnknownEventType(String),
}

/// A parsed release pipeline event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum ReleaseEvent {
    /// A feature or fix was merged into the repo's mainline.
    FeatureMerged(FeatureMergedEvent),

    /// The repo published a new version.
    VersionsUpdated(VersionsUpdatedEvent),
}

impl ReleaseEvent {
    pub fn feature_merged(repo: impl Into<String>, feature_name: impl Into<String>) -> Self {
        ReleaseEvent::FeatureMerged(FeatureMergedEvent {
            repo: RepoName::new(repo),
            feature_name: FeatureName::new(feature_name),
        })
    }

    pub fn versions_updated(
        repo: impl Into<String>,
        version: impl Into<String>,
        package_manifest: PackageManifest,
    ) -> Self {
        ReleaseEvent::VersionsUpdated(VersionsUpdatedEvent {
            repo: RepoName::new(repo),
            version: SemverVersion::new(version),
            package_manifest,
        })
    }

    /// The repo the event is about.
    pub fn repo(&self) -> &RepoName {
        match self {
            ReleaseEvent::FeatureMerged(e) => &e.repo,
            ReleaseEvent::VersionsUpdated(e) => &e.repo,
        }
    }

    /// The `event_type` tag used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            ReleaseEvent::FeatureMerged(_) => "feature_merged",
            ReleaseEvent::VersionsUpdated(_) => "versions_updated",
        }
    }

    /// Returns a copy with identifiers trimmed, or the first empty field.
    pub fn normalized(&self) -> Result<ReleaseEvent, ValidationError> {
        match self {
            ReleaseEvent::FeatureMerged(e) => {
                let repo = non_empty(e.repo.as_str(), "repo")?;
                let feature = non_empty(e.feature_name.as_str(), "feature_name")?;
                Ok(ReleaseEvent::feature_merged(repo, feature))
            }
            ReleaseEvent::VersionsUpdated(e) => {
                let repo = non_empty(e.repo.as_str(), "repo")?;
                let version = non_empty(e.version.as_str(), "version")?;
                Ok(ReleaseEvent::versions_updated(
                    repo,
                    version,
                    e.package_manifest.clone(),
                ))
            }
        }
    }
}

fn non_empty<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(trimmed)
    }
}

/// A feature merged into `repo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureMergedEvent {
    pub repo: RepoName,
    pub feature_name: FeatureName,
}

/// `repo` published `version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionsUpdatedEvent {
    pub repo: RepoName,
    pub version: SemverVersion,

    /// The published package manifest, used to find which upstream repos the
    /// release actually depends on.
    #[serde(default, alias = "package_json", deserialize_with = "manifest_or_null")]
    pub package_manifest: PackageManifest,
}

/// `null` reads as an empty manifest.
fn manifest_or_null<'de, D>(deserializer: D) -> Result<PackageManifest, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<PackageManifest>::deserialize(deserializer)?.unwrap_or_default())
}

/// A package manifest (e.g. `package.json`), kept as raw JSON.
///
/// Only the dependency sections are read; everything else is carried along
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageManifest(pub serde_json::Map<String, serde_json::Value>);

impl PackageManifest {
    pub fn new() -> Self {
        PackageManifest(serde_json::Map::new())
    }

    /// Builds a manifest with a single `dependencies` section.
    pub fn with_dependencies<'a>(deps: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let section: serde_json::Map<String, serde_json::Value> = deps
            .into_iter()
            .map(|(name, range)| (name.to_string(), serde_json::Value::from(range)))
            .collect();
        let mut map = serde_json::Map::new();
        map.insert("dependencies".to_string(), serde_json::Value::Object(section));
        PackageManifest(map)
    }

    /// Declared dependency names across all dependency sections.
    ///
    /// Each name appears once, in the order first seen. Sections that are not
    /// objects are ignored.
    pub fn dependency_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for section in DEPENDENCY_SECTIONS {
            let Some(serde_json::Value::Object(deps)) = self.0.get(section) else {
                continue;
            };
            for name in deps.keys() {
                if !names.contains(&name.as_str()) {
                    names.push(name.as_str());
                }
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_event_type_tag() {
        let event = ReleaseEvent::feature_merged("core", "Ground Pours");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({"event_type": "feature_merged", "repo": "core", "feature_name": "Ground Pours"})
        );
    }

    #[test]
    fn package_json_alias_is_accepted() {
        let event: ReleaseEvent = serde_json::from_value(json!({
            "event_type": "versions_updated",
            "repo": "eval",
            "version": "5.7.2",
            "package_json": {"dependencies": {"@tscircuit/core": "^0.1.2"}}
        }))
        .unwrap();

        let ReleaseEvent::VersionsUpdated(e) = event else {
            panic!("expected versions_updated");
        };
        assert_eq!(e.package_manifest.dependency_names(), vec!["@tscircuit/core"]);
    }

    #[test]
    fn missing_manifest_defaults_to_empty() {
        let event: ReleaseEvent = serde_json::from_value(json!({
            "event_type": "versions_updated",
            "repo": "eval",
            "version": "1.0.0"
        }))
        .unwrap();
        let ReleaseEvent::VersionsUpdated(e) = event else {
            panic!("expected versions_updated");
        };
        assert!(e.package_manifest.dependency_names().is_empty());
    }

    #[test]
    fn dependency_names_span_sections_without_duplicates() {
        let manifest: PackageManifest = serde_json::from_value(json!({
            "name": "@tscircuit/runframe",
            "dependencies": {"@tscircuit/eval": "^1"},
            "devDependencies": {"@tscircuit/eval": "^1", "typescript": "^5"},
            "peerDependencies": {"react": "*"},
            "optionalDependencies": "not-an-object"
        }))
        .unwrap();

        assert_eq!(
            manifest.dependency_names(),
            vec!["@tscircuit/eval", "typescript", "react"]
        );
    }

    #[test]
    fn normalized_trims_identifiers() {
        let event = ReleaseEvent::feature_merged("  core ", "\tGround Pours\n");
        assert_eq!(
            event.normalized().unwrap(),
            ReleaseEvent::feature_merged("core", "Ground Pours")
        );
    }

    #[test]
    fn normalized_rejects_blank_fields() {
        let event = ReleaseEvent::feature_merged("core", "   ");
        assert_eq!(
            event.normalized(),
            Err(ValidationError::EmptyField("feature_name"))
        );

        let event = ReleaseEvent::versions_updated("eval", "", PackageManifest::new());
        assert_eq!(event.normalized(), Err(ValidationError::EmptyField("version")));

        let event = ReleaseEvent::feature_merged(" ", "x");
        assert_eq!(event.normalized(), Err(ValidationError::EmptyField("repo")));
    }
}
