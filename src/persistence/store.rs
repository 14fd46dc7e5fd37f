//! The state store boundary.
//!
//! A store holds one [`TrackerState`] and a revision counter. Writers load the
//! state together with its revision and hand that revision back on save; a
//! save against a stale revision fails with [`StoreError::Conflict`] instead
//! of overwriting another writer's update.

use std::future::Future;
use std::io;

use thiserror::Error;

use crate::state::TrackerState;

/// Errors from loading or saving tracker state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another writer saved since this state was loaded.
    #[error("revision conflict: expected {expected}, store is at {actual}")]
    Conflict { expected: u64, actual: u64 },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Malformed state file, including a graph that fails validation.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schema version mismatch: expected {expected}, got {got}")]
    SchemaMismatch { expected: u32, got: u32 },
}

impl StoreError {
    /// Whether reloading and retrying can succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// A state as loaded, with the revision it was loaded at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredState {
    /// 0 when nothing has been saved yet.
    pub revision: u64,
    pub state: TrackerState,
}

/// Persists the tracker's aggregate state.
///
/// `save` must be atomic with respect to other `save` calls on the same
/// store: exactly one of two saves against the same revision succeeds.
pub trait StateStore {
    /// Loads the current state, or a fresh state over the store's default
    /// graph if nothing has been saved.
    fn load(&self) -> impl Future<Output = Result<StoredState, StoreError>> + Send;

    /// Saves `state` if the store is still at `expected_revision` and returns
    /// the new revision.
    fn save(
        &self,
        state: &TrackerState,
        expected_revision: u64,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Discards all tracked state. A following `load` returns a fresh state.
    ///
    /// The revision keeps counting up, so writers that loaded before the
    /// reset get a conflict rather than resurrecting old state.
    fn reset(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Checks `expected` against the revision currently stored.
pub(crate) fn check_revision(expected: u64, actual: u64) -> Result<(), StoreError> {
    if expected == actual {
        Ok(())
    } else {
        Err(StoreError::Conflict { expected, actual })
    }
}
