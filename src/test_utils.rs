//! Shared test utilities and arbitrary generators for property-based testing.

use std::collections::HashSet;

use crate::events::{PackageManifest, ReleaseEvent};
use crate::state::{FeatureList, MAX_TRACKED_FEATURES, TrackerState};
use crate::types::{FeatureName, RepoName, SemverVersion};
use proptest::prelude::*;

/// Repos of the default graph, plus two the graph does not know.
const REPO_POOL: [&str; 13] = [
    "core",
    "eval",
    "tscircuit.com",
    "runframe",
    "3d-viewer",
    "pcb-viewer",
    "schematic-viewer",
    "cli",
    "tscircuit",
    "svg",
    "usercode",
    "newcomer",
    "sandbox",
];

pub fn arb_repo_name() -> impl Strategy<Value = RepoName> {
    prop::sample::select(REPO_POOL.to_vec()).prop_map(RepoName::from)
}

/// A small alphabet so the same features recur across repos.
pub fn arb_feature_name() -> impl Strategy<Value = FeatureName> {
    "[a-h]".prop_map(FeatureName::new)
}

pub fn arb_version() -> impl Strategy<Value = SemverVersion> {
    (0u32..3, 0u32..5, 0u32..10).prop_map(|(a, b, c)| SemverVersion::new(format!("{a}.{b}.{c}")))
}

/// A manifest naming some pool repos, scoped or bare, alongside third-party noise.
pub fn arb_manifest() -> impl Strategy<Value = PackageManifest> {
    prop::collection::vec(
        (prop::sample::select(REPO_POOL.to_vec()), any::<bool>()),
        0..4,
    )
    .prop_map(|deps| {
        let mut names: Vec<String> = deps
            .into_iter()
            .map(|(name, scoped)| {
                if scoped {
                    format!("@tscircuit/{name}")
                } else {
                    name.to_string()
                }
            })
            .collect();
        names.push("react".to_string());
        let pairs: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "^1")).collect();
        PackageManifest::with_dependencies(pairs)
    })
}

pub fn arb_release_event() -> impl Strategy<Value = ReleaseEvent> {
    prop_oneof![
        3 => (arb_repo_name(), arb_feature_name())
            .prop_map(|(repo, feature)| ReleaseEvent::feature_merged(repo.0, feature.0)),
        2 => (arb_repo_name(), arb_version(), arb_manifest())
            .prop_map(|(repo, version, manifest)| {
                ReleaseEvent::versions_updated(repo.0, version.0, manifest)
            }),
    ]
}

pub fn arb_event_sequence(
    len: std::ops::Range<usize>,
) -> impl Strategy<Value = Vec<ReleaseEvent>> {
    prop::collection::vec(arb_release_event(), len)
}

/// Sequences mixing ordinary events with long bursts of distinct merges into
/// one repo of the main chain, so lists regularly run past
/// [`MAX_TRACKED_FEATURES`] and start evicting.
pub fn arb_overflowing_event_sequence() -> impl Strategy<Value = Vec<ReleaseEvent>> {
    let burst = (
        prop::sample::select(vec!["core", "eval", "runframe", "cli", "3d-viewer"]),
        0usize..200,
        1usize..130,
    )
        .prop_map(|(repo, base, count)| {
            (base..base + count)
                .map(|i| ReleaseEvent::feature_merged(repo, format!("w{i}")))
                .collect::<Vec<_>>()
        });
    prop::collection::vec(
        prop_oneof![
            3 => burst,
            2 => prop::collection::vec(arb_release_event(), 1..4),
        ],
        1..8,
    )
    .prop_map(|chunks| chunks.into_iter().flatten().collect())
}

/// The names in a feature list, in order.
pub fn feature_names(list: &FeatureList) -> Vec<String> {
    list.iter().map(|f| f.0.clone()).collect()
}

/// Panics if any invariant of the state is broken: duplicate entries in a
/// list, a feature in more than one list of the same repo, a list over the
/// bound, a repo in state but missing from the graph, or an upstream feature
/// that no ancestor currently has merged.
pub fn assert_invariants(state: &TrackerState) {
    for (repo, repo_state) in state.repos() {
        assert!(state.graph().contains(repo), "{repo} missing from graph");

        let lists = &repo_state.features;
        let mut seen: HashSet<&FeatureName> = HashSet::new();
        for (label, list) in [
            ("merged", &lists.merged_features),
            ("queued", &lists.queued_features),
            ("upstream", &lists.upstream_features),
        ] {
            assert!(
                list.len() <= MAX_TRACKED_FEATURES,
                "{repo} {label} list has {} entries",
                list.len()
            );
            for feature in list.iter() {
                assert!(seen.insert(feature), "{feature} appears twice in {repo}");
            }
        }

        for feature in lists.upstream_features.iter() {
            let provided = state.repos().any(|(other, other_state)| {
                other != repo
                    && state.graph().descendants_of(other).contains(repo)
                    && other_state.features.merged_features.contains(feature)
            });
            assert!(provided, "{repo} lists {feature} upstream but no ancestor has it merged");
        }
    }
}
