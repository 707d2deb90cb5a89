//! Storage module for persisting snapshots
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Content-addressable keys (SHA-1 of the URL)
//! - Insert-if-absent persistence and existence checks

mod key;
mod schema;
mod sqlite;
mod traits;

pub use key::SnapshotKey;
pub use schema::{schema_sql, table_name, TABLE_BASE_NAME};
pub use sqlite::SqliteStore;
pub use traits::{SnapshotStore, StorageError, StorageResult};

use chrono::{DateTime, Utc};
use std::path::Path;

/// Opens the snapshot database and ensures its table exists
pub fn open_store(path: &Path, table_prefix: &str) -> StorageResult<SqliteStore> {
    SqliteStore::new(path, table_prefix)
}

/// A persisted snapshot, never mutated after insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRecord {
    pub key: SnapshotKey,
    pub url: String,
    pub captured_at: DateTime<Utc>,
    pub status_line: String,
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
    pub body: Vec<u8>,
}
