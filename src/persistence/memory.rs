//! In-process state store.

use tokio::sync::Mutex;
use tracing::debug;

use super::store::{StateStore, StoreError, StoredState, check_revision};
use crate::state::{RepoGraph, TrackerState, default_graph};

/// Keeps the state in memory. Lost when the process exits.
#[derive(Debug)]
pub struct MemoryStore {
    graph: RepoGraph,
    current: Mutex<StoredState>,
}

impl MemoryStore {
    /// A store whose fresh state is built over `graph`.
    pub fn new(graph: RepoGraph) -> Self {
        let state = TrackerState::new(graph.clone());
        MemoryStore {
            graph,
            current: Mutex::new(StoredState { revision: 0, state }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new(default_graph())
    }
}

impl StateStore for MemoryStore {
    async fn load(&self) -> Result<StoredState, StoreError> {
        Ok(self.current.lock().await.clone())
    }

    async fn save(&self, state: &TrackerState, expected_revision: u64) -> Result<u64, StoreError> {
        let mut current = self.current.lock().await;
        check_revision(expected_revision, current.revision)?;

        let revision = current.revision + 1;
        *current = StoredState {
            revision,
            state: state.clone(),
        };
        debug!(revision, "Saved tracker state in memory");
        Ok(revision)
    }

    async fn reset(&self) -> Result<(), StoreError> {
        let mut current = self.current.lock().await;
        let revision = current.revision + 1;
        *current = StoredState {
            revision,
            state: TrackerState::new(self.graph.clone()),
        };
        debug!(revision, "Reset in-memory tracker state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ReleaseEvent;
    use crate::state::apply_event;

    fn merged_state() -> TrackerState {
        apply_event(
            &TrackerState::new(default_graph()),
            &ReleaseEvent::feature_merged("core", "Ground Pours"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn empty_store_loads_fresh_state() {
        let store = MemoryStore::default();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.revision, 0);
        assert_eq!(loaded.state, TrackerState::new(default_graph()));
    }

    #[tokio::test]
    async fn save_bumps_revision() {
        let store = MemoryStore::default();
        assert_eq!(store.save(&merged_state(), 0).await.unwrap(), 1);

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.revision, 1);
        assert_eq!(loaded.state, merged_state());
    }

    #[tokio::test]
    async fn stale_save_conflicts_and_keeps_winner() {
        let store = MemoryStore::default();
        store.save(&merged_state(), 0).await.unwrap();

        let err = store
            .save(&TrackerState::new(default_graph()), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { expected: 0, actual: 1 }));
        assert_eq!(store.load().await.unwrap().state, merged_state());
    }

    #[tokio::test]
    async fn reset_returns_fresh_state_and_invalidates_old_revisions() {
        let store = MemoryStore::default();
        store.save(&merged_state(), 0).await.unwrap();
        store.reset().await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.state, TrackerState::new(default_graph()));
        assert_eq!(loaded.revision, 2);
        assert!(store.save(&merged_state(), 1).await.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn custom_graph_seeds_fresh_state() {
        let store = MemoryStore::new(RepoGraph::empty());
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.state.repos().count(), 0);
    }
}
