//! The tracker's aggregate state.
//!
//! [`TrackerState`] holds the repo graph, each repo's running feature lists
//! and the per-repo history of published versions. It is a plain value: the
//! applier takes one and returns the next, and stores serialize it whole.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::graph::RepoGraph;
use super::ledger::FeatureList;
use super::version::latest_version;
use crate::types::{FeatureName, RepoName, SemverVersion};

/// Maximum number of version records kept per repo. Oldest are pruned first.
pub const MAX_RECORDED_VERSIONS: usize = 100;

/// The three feature lists of one repo at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoVersionState {
    /// Authoritatively incorporated into the repo's mainline.
    pub merged_features: FeatureList,
    /// Available from an upstream dependency, not yet in a published version.
    pub queued_features: FeatureList,
    /// Known to exist in an ancestor, not yet queued here.
    pub upstream_features: FeatureList,
}

impl RepoVersionState {
    /// Whether the feature is merged or queued, i.e. already incorporated or
    /// on its way in.
    pub fn has_merged_or_queued(&self, feature: &FeatureName) -> bool {
        self.merged_features.contains(feature) || self.queued_features.contains(feature)
    }
}

/// A repo's running state: its current version pointer and feature lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoState {
    /// The most recently published version, if any.
    pub version: Option<SemverVersion>,
    pub features: RepoVersionState,
}

/// A snapshot of a repo's feature lists taken when a version was published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version: SemverVersion,
    pub state: RepoVersionState,
}

/// The aggregate root owned by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerState {
    graph: RepoGraph,
    repos: BTreeMap<RepoName, RepoState>,
    #[serde(default)]
    history: BTreeMap<RepoName, Vec<VersionRecord>>,
}

impl TrackerState {
    /// A fresh state: every graph repo present with empty lists and no history.
    pub fn new(graph: RepoGraph) -> Self {
        let repos = graph
            .repos()
            .map(|repo| (repo.clone(), RepoState::default()))
            .collect();
        TrackerState {
            graph,
            repos,
            history: BTreeMap::new(),
        }
    }

    pub fn graph(&self) -> &RepoGraph {
        &self.graph
    }

    /// The running state of `repo`, if it has ever been referenced.
    pub fn repo(&self, repo: &RepoName) -> Option<&RepoState> {
        self.repos.get(repo)
    }

    pub fn repos(&self) -> impl Iterator<Item = (&RepoName, &RepoState)> {
        self.repos.iter()
    }

    /// Registers `repo` in the graph (edge-less) and state if unknown, and
    /// returns its running state.
    pub fn ensure_repo(&mut self, repo: &RepoName) -> &mut RepoState {
        self.graph.upsert(repo);
        self.repos.entry(repo.clone()).or_default()
    }

    /// Recorded versions of `repo`, oldest first.
    pub fn history_of(&self, repo: &RepoName) -> &[VersionRecord] {
        self.history.get(repo).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The feature lists recorded when `repo` published `version`.
    pub fn version_state(
        &self,
        repo: &RepoName,
        version: &SemverVersion,
    ) -> Option<&RepoVersionState> {
        self.history_of(repo)
            .iter()
            .find(|record| &record.version == version)
            .map(|record| &record.state)
    }

    /// The numerically greatest recorded version of `repo`.
    ///
    /// This can differ from the current version pointer when versions were
    /// published out of order.
    pub fn latest_recorded_version(&self, repo: &RepoName) -> Option<&SemverVersion> {
        latest_version(self.history_of(repo).iter().map(|record| &record.version))
    }

    /// Records a published version, replacing an earlier record of the same
    /// version in place. Prunes the oldest records beyond
    /// [`MAX_RECORDED_VERSIONS`].
    pub fn record_version(&mut self, repo: &RepoName, version: SemverVersion, state: RepoVersionState) {
        let records = self.history.entry(repo.clone()).or_default();
        match records.iter_mut().find(|record| record.version == version) {
            Some(existing) => existing.state = state,
            None => records.push(VersionRecord { version, state }),
        }
        if records.len() > MAX_RECORDED_VERSIONS {
            let excess = records.len() - MAX_RECORDED_VERSIONS;
            records.drain(..excess);
        }
    }

    /// Running state of an already-registered repo.
    pub(crate) fn repo_mut(&mut self, repo: &RepoName) -> Option<&mut RepoState> {
        self.repos.get_mut(repo)
    }
}
