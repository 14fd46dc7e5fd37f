//! Per-repo snapshot rows.

use serde::{Deserialize, Serialize};

use crate::state::{FeatureList, RepoState, TrackerState};
use crate::types::{FeatureName, RepoName, SemverVersion};

/// One repo's externally visible state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSnapshot {
    pub repo: RepoName,
    pub version: Option<SemverVersion>,
    pub merged_features: Vec<FeatureName>,
    pub queued_features: Vec<FeatureName>,
    pub upstream_features: Vec<FeatureName>,
}

impl RepoSnapshot {
    fn from_state(repo: &RepoName, state: Option<&RepoState>) -> Self {
        let lists = state.map(|s| &s.features);
        let copy = |list: Option<&FeatureList>| {
            list.map(|l| l.as_slice().to_vec()).unwrap_or_default()
        };
        RepoSnapshot {
            repo: repo.clone(),
            version: state.and_then(|s| s.version.clone()),
            merged_features: copy(lists.map(|l| &l.merged_features)),
            queued_features: copy(lists.map(|l| &l.queued_features)),
            upstream_features: copy(lists.map(|l| &l.upstream_features)),
        }
    }
}

/// Builds one row per graph repo, sorted by repo name.
///
/// A repo known to the graph but never touched by an event gets empty lists
/// and no version.
pub fn build_snapshot(state: &TrackerState) -> Vec<RepoSnapshot> {
    // Graph repos are kept in a BTreeMap, so this is already sorted.
    state
        .graph()
        .repos()
        .map(|repo| RepoSnapshot::from_state(repo, state.repo(repo)))
        .collect()
}
