//! Event transitions for the release tracker state machine.
//!
//! Pure functions: given the current [`TrackerState`] and one
//! [`ReleaseEvent`], compute the next state. No I/O happens here and the input
//! state is never modified, so a rejected event leaves nothing behind.
//!
//! # Propagation
//!
//! Features move one hop at a time. Merging a feature into a repo makes it
//! upstream-only in the repo's direct dependents. A dependent queues it when
//! it publishes a version against the upstream, merges it when the feature
//! lands in its own mainline, and only then passes it on to its own
//! dependents (either on merge, or when the queued feature is promoted by the
//! next version it publishes).

use tracing::{debug, info};

use super::graph::RepoGraph;
use super::model::TrackerState;
use crate::events::{FeatureMergedEvent, PackageManifest, ReleaseEvent, ValidationError, VersionsUpdatedEvent};
use crate::types::{FeatureName, RepoName, normalize_name};

/// Package scope stripped from manifest dependency names by default.
pub const DEFAULT_PACKAGE_SCOPE: &str = "@tscircuit/";

/// Applies release events to tracker state.
///
/// Carries the package scope used to map manifest dependency names (e.g.
/// `@tscircuit/core`) onto repo names (`core`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventApplier {
    package_scope: String,
}

impl Default for EventApplier {
    fn default() -> Self {
        EventApplier::new(DEFAULT_PACKAGE_SCOPE)
    }
}

impl EventApplier {
    pub fn new(package_scope: impl Into<String>) -> Self {
        EventApplier {
            package_scope: package_scope.into(),
        }
    }

    pub fn package_scope(&self) -> &str {
        &self.package_scope
    }

    /// Computes the state that results from applying `event` to `state`.
    ///
    /// Returns an error, and no state, if the event has a blank identifier.
    /// Repos the graph does not know are registered with no edges.
    pub fn apply(
        &self,
        state: &TrackerState,
        event: &ReleaseEvent,
    ) -> Result<TrackerState, ValidationError> {
        let event = event.normalized()?;
        let mut next = state.clone();
        match &event {
            ReleaseEvent::FeatureMerged(e) => apply_feature_merged(&mut next, e),
            ReleaseEvent::VersionsUpdated(e) => self.apply_versions_updated(&mut next, e),
        }
        Ok(next)
    }

    /// Works out which repos a published version draws features from.
    ///
    /// Dependency names from the manifest are stripped of the package scope
    /// and matched against known repo names, ignoring case and punctuation.
    /// When nothing matches, the repo's static upstream edge is used instead.
    pub fn resolve_upstreams(
        &self,
        graph: &RepoGraph,
        repo: &RepoName,
        manifest: &PackageManifest,
    ) -> Vec<RepoName> {
        let mut resolved: Vec<RepoName> = Vec::new();
        for name in manifest.dependency_names() {
            let unscoped = name.strip_prefix(self.package_scope.as_str()).unwrap_or(name);
            let wanted = normalize_name(unscoped);
            if wanted.is_empty() {
                continue;
            }
            let matched = graph
                .repos()
                .find(|candidate| *candidate != repo && candidate.normalized() == wanted);
            if let Some(found) = matched
                && !resolved.contains(found)
            {
                resolved.push(found.clone());
            }
        }

        if resolved.is_empty() {
            resolved.extend(graph.upstream_of(repo).cloned());
        }
        resolved
    }

    fn apply_versions_updated(&self, state: &mut TrackerState, event: &VersionsUpdatedEvent) {
        let repo = &event.repo;
        state.ensure_repo(repo);

        let upstreams = self.resolve_upstreams(state.graph(), repo, &event.package_manifest);
        let upstream_merged: Vec<FeatureName> = upstreams
            .iter()
            .filter_map(|upstream| state.repo(upstream))
            .flat_map(|upstream| upstream.features.merged_features.iter().cloned())
            .collect();

        let repo_state = state.ensure_repo(repo);
        let lists = &mut repo_state.features;

        let promoted = lists.queued_features.take();
        let mut evicted = Vec::new();
        for feature in &promoted {
            evicted.extend(lists.merged_features.insert(feature.clone()));
        }

        for feature in upstream_merged {
            if !lists.has_merged_or_queued(&feature) {
                lists.queued_features.insert(feature);
            }
        }

        let now_known: Vec<FeatureName> = lists
            .upstream_features
            .iter()
            .filter(|feature| lists.has_merged_or_queued(feature))
            .cloned()
            .collect();
        for feature in &now_known {
            lists.upstream_features.remove(feature);
        }

        repo_state.version = Some(event.version.clone());
        let recorded = repo_state.features.clone();
        state.record_version(repo, event.version.clone(), recorded);

        info!(
            repo = %repo,
            version = %event.version,
            upstreams = ?upstreams,
            promoted = promoted.len(),
            evicted = ?evicted,
            "Recorded published version"
        );

        propagate_downstream(state, repo, &promoted);
        retract_evicted(state, repo, &evicted);
    }
}

/// Applies `event` with the default package scope.
pub fn apply_event(
    state: &TrackerState,
    event: &ReleaseEvent,
) -> Result<TrackerState, ValidationError> {
    EventApplier::default().apply(state, event)
}

fn apply_feature_merged(state: &mut TrackerState, event: &FeatureMergedEvent) {
    let feature = &event.feature_name;
    let lists = &mut state.ensure_repo(&event.repo).features;

    lists.upstream_features.remove(feature);
    lists.queued_features.remove(feature);
    let evicted = lists.merged_features.insert(feature.clone());

    debug!(
        repo = %event.repo,
        feature = %feature,
        evicted = ?evicted,
        "Feature merged"
    );

    propagate_downstream(state, &event.repo, std::slice::from_ref(feature));
    retract_evicted(state, &event.repo, &evicted);
}

/// Marks `features` as upstream-only in each direct dependent of `repo`,
/// skipping dependents that already have them merged or queued.
fn propagate_downstream(state: &mut TrackerState, repo: &RepoName, features: &[FeatureName]) {
    if features.is_empty() {
        return;
    }

    let dependents = state.graph().downstream_of(repo).to_vec();
    for dependent in &dependents {
        let Some(dependent_state) = state.repo_mut(dependent) else {
            continue;
        };
        let lists = &mut dependent_state.features;
        let mut added = 0usize;
        for feature in features {
            if lists.has_merged_or_queued(feature) {
                continue;
            }
            lists.upstream_features.insert(feature.clone());
            added += 1;
        }
        debug!(from = %repo, to = %dependent, added, "Propagated upstream features");
    }
}

/// Withdraws features that `repo` just evicted from its merged list from the
/// upstream lists of its direct dependents.
///
/// A dependent keeps the feature while any other repo feeding it still has
/// it merged.
fn retract_evicted(state: &mut TrackerState, repo: &RepoName, evicted: &[FeatureName]) {
    if evicted.is_empty() {
        return;
    }

    let dependents = state.graph().downstream_of(repo).to_vec();
    for dependent in &dependents {
        let stale: Vec<FeatureName> = evicted
            .iter()
            .filter(|feature| {
                !state.graph().feeders_of(dependent).any(|feeder| {
                    state
                        .repo(feeder)
                        .is_some_and(|s| s.features.merged_features.contains(feature))
                })
            })
            .cloned()
            .collect();

        let Some(dependent_state) = state.repo_mut(dependent) else {
            continue;
        };
        let upstream = &mut dependent_state.features.upstream_features;
        let retracted: Vec<&FeatureName> =
            stale.iter().filter(|feature| upstream.remove(feature)).collect();
        if !retracted.is_empty() {
            debug!(from = %repo, to = %dependent, retracted = ?retracted, "Retracted evicted upstream features");
        }
    }
}
