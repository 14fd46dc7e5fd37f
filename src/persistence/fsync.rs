//! fsync helpers for the atomic state file write.
//!
//! Syncing the file makes its bytes durable. Syncing the parent directory
//! makes the rename that published it durable; without that, a power loss can
//! leave the directory pointing at the previous state file.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Flushes a file's contents and metadata to disk.
pub fn fsync_file(file: &File) -> io::Result<()> {
    file.sync_all()
}

/// Flushes a directory's entries to disk.
///
/// Callers pass the directory that holds a freshly renamed file.
pub fn fsync_dir(dir_path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(dir_path)?;
    dir.sync_all()
}
