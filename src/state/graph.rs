//! The repository dependency graph.
//!
//! Each repo has at most one upstream repo and any number of downstream
//! dependents. The graph is validated once at construction and its edges are
//! never changed afterwards; the only mutation is [`RepoGraph::upsert`], which
//! adds an edge-less node for a repo first seen in an event.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::RepoName;

/// Errors detected while validating a graph definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// An edge names a repo that has no node of its own.
    #[error("repo {from} references unknown repo {missing}")]
    UnknownRepo { from: RepoName, missing: RepoName },

    /// `repo` names `upstream` as its upstream, but `upstream` does not list
    /// `repo` downstream.
    #[error("{upstream} is upstream of {repo} but does not list it downstream")]
    InconsistentEdge { repo: RepoName, upstream: RepoName },

    /// A repo lists itself as a dependency.
    #[error("repo {0} references itself")]
    SelfReference(RepoName),

    /// A repo lists the same downstream repo twice.
    #[error("repo {repo} lists downstream {downstream} more than once")]
    DuplicateEdge { repo: RepoName, downstream: RepoName },

    /// Following downstream edges returns to a repo already on the path.
    #[error("dependency cycle: {}", format_cycle(.0))]
    Cycle(Vec<RepoName>),
}

fn format_cycle(cycle: &[RepoName]) -> String {
    cycle
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors loading a graph definition from disk.
#[derive(Debug, Error)]
pub enum GraphFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid graph: {0}")]
    Invalid(#[from] GraphError),
}

/// A single node: the repo's upstream dependency and its direct dependents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoGraphNode {
    #[serde(default)]
    pub upstream: Option<RepoName>,
    #[serde(default)]
    pub downstream: Vec<RepoName>,
}

impl RepoGraphNode {
    pub fn new(upstream: Option<&str>, downstream: &[&str]) -> Self {
        RepoGraphNode {
            upstream: upstream.map(RepoName::from),
            downstream: downstream.iter().copied().map(RepoName::from).collect(),
        }
    }
}

/// The validated repository graph.
///
/// Serializes as a plain map of repo name to node; deserialization re-runs
/// validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<RepoName, RepoGraphNode>", into = "BTreeMap<RepoName, RepoGraphNode>")]
pub struct RepoGraph {
    nodes: BTreeMap<RepoName, RepoGraphNode>,
}

impl RepoGraph {
    /// Builds a graph, checking that edges are consistent and acyclic.
    pub fn new(nodes: BTreeMap<RepoName, RepoGraphNode>) -> Result<Self, GraphError> {
        validate(&nodes)?;
        Ok(RepoGraph { nodes })
    }

    /// A graph with no repos. Every repo will be auto-registered.
    pub fn empty() -> Self {
        RepoGraph {
            nodes: BTreeMap::new(),
        }
    }

    /// Loads and validates a JSON graph definition.
    pub fn from_json_file(path: &Path) -> Result<Self, GraphFileError> {
        let bytes = std::fs::read(path)?;
        let nodes: BTreeMap<RepoName, RepoGraphNode> = serde_json::from_slice(&bytes)?;
        Ok(RepoGraph::new(nodes)?)
    }

    pub fn contains(&self, repo: &RepoName) -> bool {
        self.nodes.contains_key(repo)
    }

    pub fn neighbors_of(&self, repo: &RepoName) -> Option<&RepoGraphNode> {
        self.nodes.get(repo)
    }

    /// The static upstream edge of `repo`, if any.
    pub fn upstream_of(&self, repo: &RepoName) -> Option<&RepoName> {
        self.nodes.get(repo).and_then(|n| n.upstream.as_ref())
    }

    /// Direct dependents of `repo`, in declaration order.
    pub fn downstream_of(&self, repo: &RepoName) -> &[RepoName] {
        self.nodes
            .get(repo)
            .map(|n| n.downstream.as_slice())
            .unwrap_or(&[])
    }

    /// Repos that list `repo` among their direct dependents.
    ///
    /// A superset of the static upstream: repos with no upstream edge of their
    /// own (the viewers) still feed their dependents.
    pub fn feeders_of<'a>(&'a self, repo: &'a RepoName) -> impl Iterator<Item = &'a RepoName> {
        self.nodes
            .iter()
            .filter(move |(_, node)| node.downstream.contains(repo))
            .map(|(name, _)| name)
    }

    /// Walks upstream edges from `repo`, nearest ancestor first.
    pub fn ancestors_of<'a>(&'a self, repo: &RepoName) -> Ancestors<'a> {
        Ancestors {
            graph: self,
            next: self.upstream_of(repo),
            remaining: self.nodes.len(),
        }
    }

    /// Every repo reachable through downstream edges, breadth-first.
    ///
    /// The starting repo is not included and each repo appears once.
    pub fn descendants_of(&self, repo: &RepoName) -> Vec<RepoName> {
        let mut result = Vec::new();
        let mut visited: HashSet<&RepoName> = HashSet::new();
        let mut queue: VecDeque<&RepoName> = VecDeque::new();

        visited.insert(repo);
        queue.push_back(repo);

        while let Some(current) = queue.pop_front() {
            for child in self.downstream_of(current) {
                if visited.insert(child) {
                    result.push(child.clone());
                    queue.push_back(child);
                }
            }
        }

        result
    }

    /// Adds an edge-less node for `repo` if it is not already present.
    ///
    /// Returns `true` when a node was added. Existing edges are untouched.
    pub fn upsert(&mut self, repo: &RepoName) -> bool {
        if self.nodes.contains_key(repo) {
            return false;
        }
        self.nodes.insert(repo.clone(), RepoGraphNode::default());
        true
    }

    /// Repo names in sorted order.
    pub fn repos(&self) -> impl Iterator<Item = &RepoName> {
        self.nodes.keys()
    }

    pub fn nodes(&self) -> &BTreeMap<RepoName, RepoGraphNode> {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for RepoGraph {
    fn default() -> Self {
        default_graph()
    }
}

impl TryFrom<BTreeMap<RepoName, RepoGraphNode>> for RepoGraph {
    type Error = GraphError;

    fn try_from(nodes: BTreeMap<RepoName, RepoGraphNode>) -> Result<Self, Self::Error> {
        RepoGraph::new(nodes)
    }
}

impl From<RepoGraph> for BTreeMap<RepoName, RepoGraphNode> {
    fn from(graph: RepoGraph) -> Self {
        graph.nodes
    }
}

/// Lazy iterator over the upstream chain of a repo.
///
/// Bounded by the node count, so it terminates even if handed a graph that
/// somehow bypassed validation.
pub struct Ancestors<'a> {
    graph: &'a RepoGraph,
    next: Option<&'a RepoName>,
    remaining: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a RepoName;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        self.remaining -= 1;
        self.next = self.graph.upstream_of(current);
        Some(current)
    }
}

/// The pipeline graph used when no graph file is configured.
///
/// ```text
/// core -> eval -> (runframe, tscircuit.com)
/// (3d-viewer, pcb-viewer, schematic-viewer) -> runframe
/// runframe -> cli -> tscircuit -> (svg, usercode)
/// ```
pub fn default_graph() -> RepoGraph {
    let nodes: BTreeMap<RepoName, RepoGraphNode> = [
        ("core", RepoGraphNode::new(None, &["eval"])),
        ("eval", RepoGraphNode::new(Some("core"), &["runframe", "tscircuit.com"])),
        ("tscircuit.com", RepoGraphNode::new(Some("eval"), &[])),
        ("runframe", RepoGraphNode::new(Some("eval"), &["cli"])),
        ("3d-viewer", RepoGraphNode::new(None, &["runframe"])),
        ("pcb-viewer", RepoGraphNode::new(None, &["runframe"])),
        ("schematic-viewer", RepoGraphNode::new(None, &["runframe"])),
        ("cli", RepoGraphNode::new(Some("runframe"), &["tscircuit"])),
        ("tscircuit", RepoGraphNode::new(Some("cli"), &["svg", "usercode"])),
        ("svg", RepoGraphNode::new(Some("tscircuit"), &[])),
        ("usercode", RepoGraphNode::new(Some("tscircuit"), &[])),
    ]
    .into_iter()
    .map(|(name, node)| (RepoName::from(name), node))
    .collect();

    RepoGraph { nodes }
}

fn validate(nodes: &BTreeMap<RepoName, RepoGraphNode>) -> Result<(), GraphError> {
    for (repo, node) in nodes {
        if let Some(upstream) = &node.upstream {
            if upstream == repo {
                return Err(GraphError::SelfReference(repo.clone()));
            }
            let Some(upstream_node) = nodes.get(upstream) else {
                return Err(GraphError::UnknownRepo {
                    from: repo.clone(),
                    missing: upstream.clone(),
                });
            };
            if !upstream_node.downstream.contains(repo) {
                return Err(GraphError::InconsistentEdge {
                    repo: repo.clone(),
                    upstream: upstream.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        for downstream in &node.downstream {
            if downstream == repo {
                return Err(GraphError::SelfReference(repo.clone()));
            }
            if !nodes.contains_key(downstream) {
                return Err(GraphError::UnknownRepo {
                    from: repo.clone(),
                    missing: downstream.clone(),
                });
            }
            if !seen.insert(downstream) {
                return Err(GraphError::DuplicateEdge {
                    repo: repo.clone(),
                    downstream: downstream.clone(),
                });
            }
        }
    }

    // Every upstream edge is mirrored by a downstream edge, so checking the
    // downstream relation covers both directions.
    match detect_cycle(nodes) {
        Some(cycle) => Err(GraphError::Cycle(cycle)),
        None => Ok(()),
    }
}

/// Three-colour DFS over downstream edges.
///
/// Returns the repos on the first cycle found, in traversal order.
fn detect_cycle(nodes: &BTreeMap<RepoName, RepoGraphNode>) -> Option<Vec<RepoName>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    fn dfs<'a>(
        node: &'a RepoName,
        nodes: &'a BTreeMap<RepoName, RepoGraphNode>,
        colors: &mut HashMap<&'a RepoName, Color>,
        path: &mut Vec<&'a RepoName>,
    ) -> Option<Vec<RepoName>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        for child in nodes.get(node).map(|n| n.downstream.as_slice()).unwrap_or(&[]) {
            match colors.get(child).copied().unwrap_or(Color::White) {
                Color::Gray => {
                    let pos = path.iter().position(|&p| p == child).unwrap_or(0);
                    return Some(path[pos..].iter().map(|&r| r.clone()).collect());
                }
                Color::White => {
                    if let Some(cycle) = dfs(child, nodes, colors, path) {
                        return Some(cycle);
                    }
                }
                Color::Black => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    let mut colors: HashMap<&RepoName, Color> = HashMap::new();
    for repo in nodes.keys() {
        if colors.get(repo).copied().unwrap_or(Color::White) == Color::White {
            let mut path = Vec::new();
            if let Some(cycle) = dfs(repo, nodes, &mut colors, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}
