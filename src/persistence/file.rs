//! File-backed state store.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info};

use super::snapshot::{PersistedTrackerState, save_snapshot_atomic, try_load_snapshot};
use super::store::{StateStore, StoreError, StoredState, check_revision};
use crate::state::{RepoGraph, TrackerState};

/// Name of the state file inside the state directory.
pub const STATE_FILE_NAME: &str = "tracker-state.json";

/// Stores the state as a single JSON file, replaced atomically on each save.
///
/// Saves and resets are serialized by an in-process lock so the revision
/// check and the write happen together. Loads skip the lock: the file is only
/// ever replaced by rename, so a reader sees either the old or the new
/// snapshot in full. Two processes sharing one state directory are not
/// coordinated.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    graph: RepoGraph,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(state_dir: impl AsRef<Path>, graph: RepoGraph) -> Self {
        FileStore {
            path: state_dir.as_ref().join(STATE_FILE_NAME),
            graph,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn current_revision(&self) -> Result<u64, StoreError> {
        Ok(try_load_snapshot(&self.path)?
            .map(|snapshot| snapshot.revision)
            .unwrap_or(0))
    }
}

impl StateStore for FileStore {
    async fn load(&self) -> Result<StoredState, StoreError> {
        match try_load_snapshot(&self.path)? {
            Some(snapshot) => Ok(StoredState {
                revision: snapshot.revision,
                state: snapshot.state,
            }),
            None => Ok(StoredState {
                revision: 0,
                state: TrackerState::new(self.graph.clone()),
            }),
        }
    }

    async fn save(&self, state: &TrackerState, expected_revision: u64) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().await;
        check_revision(expected_revision, self.current_revision()?)?;

        let revision = expected_revision + 1;
        save_snapshot_atomic(&self.path, &PersistedTrackerState::new(revision, state.clone()))?;
        debug!(path = %self.path.display(), revision, "Saved tracker state");
        Ok(revision)
    }

    async fn reset(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let revision = self.current_revision()? + 1;
        let fresh = TrackerState::new(self.graph.clone());
        save_snapshot_atomic(&self.path, &PersistedTrackerState::new(revision, fresh))?;
        info!(path = %self.path.display(), revision, "Reset tracker state");
        Ok(())
    }
}
