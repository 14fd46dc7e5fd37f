//! Whole-tracker summary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::snapshot::{RepoSnapshot, build_snapshot};
use crate::state::{RepoGraph, TrackerState};
use crate::types::{RepoName, SemverVersion};

/// The graph, the latest version of each repo and the per-repo rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerSummary {
    pub repo_graph: RepoGraph,
    /// Numerically greatest recorded version per repo. Repos that have never
    /// published are absent.
    pub latest_versions: BTreeMap<RepoName, SemverVersion>,
    pub repos: Vec<RepoSnapshot>,
}

pub fn build_summary(state: &TrackerState) -> TrackerSummary {
    let latest_versions = state
        .graph()
        .repos()
        .filter_map(|repo| {
            let latest = state
                .latest_recorded_version(repo)
                .or_else(|| state.repo(repo).and_then(|s| s.version.as_ref()))?;
            Some((repo.clone(), latest.clone()))
        })
        .collect();

    TrackerSummary {
        repo_graph: state.graph().clone(),
        latest_versions,
        repos: build_snapshot(state),
    }
}
