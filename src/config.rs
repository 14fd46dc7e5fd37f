//! Tracker configuration from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `RELEASE_TRACKER_STATE_DIR` | `.data/release-tracker` |
//! | `RELEASE_TRACKER_GRAPH_FILE` | unset (built-in graph) |
//! | `RELEASE_TRACKER_PACKAGE_SCOPE` | `@tscircuit/` |
//! | `RELEASE_TRACKER_MAX_CONFLICT_RETRIES` | `3` |
//!
//! Unparseable numbers fall back to their defaults. A graph file that cannot
//! be read or does not validate is an error.

use std::path::PathBuf;

use thiserror::Error;

use crate::persistence::FileStore;
use crate::state::{DEFAULT_PACKAGE_SCOPE, EventApplier, GraphFileError, RepoGraph, default_graph};
use crate::tracker::RetryConfig;

pub const STATE_DIR_VAR: &str = "RELEASE_TRACKER_STATE_DIR";
pub const GRAPH_FILE_VAR: &str = "RELEASE_TRACKER_GRAPH_FILE";
pub const PACKAGE_SCOPE_VAR: &str = "RELEASE_TRACKER_PACKAGE_SCOPE";
pub const MAX_CONFLICT_RETRIES_VAR: &str = "RELEASE_TRACKER_MAX_CONFLICT_RETRIES";

const DEFAULT_STATE_DIR: &str = ".data/release-tracker";
const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot load repo graph from {path}: {source}")]
    Graph {
        path: PathBuf,
        #[source]
        source: GraphFileError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Directory holding `tracker-state.json`.
    pub state_dir: PathBuf,

    /// Repo graph definition. `None` uses [`default_graph`].
    pub graph_file: Option<PathBuf>,

    /// Prefix stripped from manifest dependency names before matching repos.
    pub package_scope: String,

    /// How many times a save conflict is retried before giving up.
    pub max_conflict_retries: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            graph_file: None,
            package_scope: DEFAULT_PACKAGE_SCOPE.to_string(),
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

impl TrackerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source. Blank values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        TrackerConfig {
            state_dir: get(STATE_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.state_dir),
            graph_file: get(GRAPH_FILE_VAR).map(PathBuf::from),
            package_scope: get(PACKAGE_SCOPE_VAR).unwrap_or(defaults.package_scope),
            max_conflict_retries: get(MAX_CONFLICT_RETRIES_VAR)
                .and_then(|s| s.trim().parse::<u32>().ok())
                .unwrap_or(defaults.max_conflict_retries),
        }
    }

    /// The configured graph, or the built-in one.
    pub fn load_graph(&self) -> Result<RepoGraph, ConfigError> {
        match &self.graph_file {
            Some(path) => RepoGraph::from_json_file(path).map_err(|source| ConfigError::Graph {
                path: path.clone(),
                source,
            }),
            None => Ok(default_graph()),
        }
    }

    pub fn applier(&self) -> EventApplier {
        EventApplier::new(self.package_scope.clone())
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_conflict_retries,
            ..RetryConfig::DEFAULT
        }
    }

    /// A file store in the configured state directory.
    pub fn file_store(&self) -> Result<FileStore, ConfigError> {
        Ok(FileStore::new(&self.state_dir, self.load_graph()?))
    }
}
