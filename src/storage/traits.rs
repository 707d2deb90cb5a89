//! Storage traits and error types
//!
//! This module defines the trait interface for snapshot backends and
//! associated error types.

use crate::crawler::Capture;
use crate::storage::{SnapshotKey, SnapshotRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt record for key {0}")]
    CorruptRecord(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Insert-only snapshot persistence
///
/// No update or delete: a key, once written, keeps its first capture.
pub trait SnapshotStore: Send {
    /// Creates the backing table if absent
    fn ensure_schema(&mut self) -> StorageResult<()>;

    /// Checks for a record under `key`
    fn contains(&self, key: &SnapshotKey) -> StorageResult<bool>;

    /// Inserts a record for `url` unless one exists
    ///
    /// Returns `Ok(true)` when a row was written and `Ok(false)` when the
    /// key was already present.
    fn put(&mut self, url: &str, capture: &Capture) -> StorageResult<bool>;

    /// Reads back the record for `url`
    fn get(&self, url: &str) -> StorageResult<Option<SnapshotRecord>>;

    /// Number of stored snapshots
    fn count(&self) -> StorageResult<u64>;

    /// Checks whether `url` has been snapshotted
    ///
    /// Query failures are logged and reported as "absent", so the URL is
    /// fetched again rather than silently skipped.
    fn exists(&self, url: &str) -> bool {
        let key = SnapshotKey::from_url(url);
        match self.contains(&key) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Existence check for {} ({}) failed: {}", url, key, e);
                false
            }
        }
    }
}
