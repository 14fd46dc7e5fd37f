//! On-disk format of the tracker state file.
//!
//! # File Format
//!
//! A single JSON document wrapping the whole [`TrackerState`] with a schema
//! version, the time it was saved and the store revision it represents.
//!
//! # Atomic Writes
//!
//! The file is replaced using write-to-temp-then-rename:
//! 1. Write to `<path>.tmp`
//! 2. fsync the temp file
//! 3. Rename over `<path>`
//! 4. fsync the directory
//!
//! Readers see either the previous state or the new one, never a partial
//! write.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fsync::{fsync_dir, fsync_file};
use super::store::StoreError;
use crate::state::TrackerState;

/// Current schema version. Increment when making breaking changes.
pub const SCHEMA_VERSION: u32 = 1;

/// The JSON document stored at `<state_dir>/tracker-state.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedTrackerState {
    pub schema_version: u32,

    /// When this revision was written.
    pub saved_at: DateTime<Utc>,

    /// Store revision, incremented by every successful save.
    pub revision: u64,

    pub state: TrackerState,
}

impl PersistedTrackerState {
    pub fn new(revision: u64, state: TrackerState) -> Self {
        PersistedTrackerState {
            schema_version: SCHEMA_VERSION,
            saved_at: Utc::now(),
            revision,
            state,
        }
    }
}

/// Writes the state file atomically, creating the parent directory if needed.
pub fn save_snapshot_atomic(path: &Path, snapshot: &PersistedTrackerState) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(snapshot)?;

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        file.write_all(&bytes)?;
        fsync_file(&file)?;
    }

    std::fs::rename(&tmp_path, path)?;

    if let Some(parent) = path.parent() {
        fsync_dir(parent)?;
    }

    Ok(())
}

/// Reads and checks the state file.
///
/// Fails if the file is unreadable, is not valid JSON, carries a graph that
/// no longer validates, or has a different schema version.
pub fn load_snapshot(path: &Path) -> Result<PersistedTrackerState, StoreError> {
    let bytes = std::fs::read(path)?;
    let snapshot: PersistedTrackerState = serde_json::from_slice(&bytes)?;

    if snapshot.schema_version != SCHEMA_VERSION {
        return Err(StoreError::SchemaMismatch {
            expected: SCHEMA_VERSION,
            got: snapshot.schema_version,
        });
    }

    Ok(snapshot)
}

/// Like [`load_snapshot`], but a missing file is `Ok(None)`.
pub fn try_load_snapshot(path: &Path) -> Result<Option<PersistedTrackerState>, StoreError> {
    match load_snapshot(path) {
        Ok(snapshot) => Ok(Some(snapshot)),
        Err(StoreError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
