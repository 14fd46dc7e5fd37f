//! Persistence layer for the release tracker.
//!
//! The whole [`TrackerState`](crate::state::TrackerState) is stored as one
//! blob behind the [`StateStore`] trait, with compare-and-swap on a revision
//! counter so concurrent writers cannot lose each other's updates.
//!
//! # Adapters
//!
//! - [`MemoryStore`]: in-process, for tests and ephemeral runs
//! - [`FileStore`]: a JSON file replaced atomically on every save
//!
//! # File Layout
//!
//! ```text
//! <state_dir>/
//!   tracker-state.json      # schema_version, saved_at, revision, state
//!   tracker-state.json.tmp  # only present mid-write
//! ```

pub mod file;
pub mod fsync;
pub mod memory;
pub mod snapshot;
pub mod store;

pub use file::{FileStore, STATE_FILE_NAME};
pub use fsync::{fsync_dir, fsync_file};
pub use memory::MemoryStore;
pub use snapshot::{
    PersistedTrackerState, SCHEMA_VERSION, load_snapshot, save_snapshot_atomic, try_load_snapshot,
};
pub use store::{StateStore, StoreError, StoredState};
