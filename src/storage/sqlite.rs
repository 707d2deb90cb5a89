//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the SnapshotStore trait.

use crate::crawler::Capture;
use crate::storage::schema::{initialize_schema, table_name};
use crate::storage::traits::{SnapshotStore, StorageError, StorageResult};
use crate::storage::{SnapshotKey, SnapshotRecord};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite snapshot backend
pub struct SqliteStore {
    conn: Connection,
    table: String,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and ensures the schema
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `table_prefix` - Prefix for the snapshot table name
    pub fn new(path: &Path, table_prefix: &str) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        let mut store = Self {
            conn,
            table: table_name(table_prefix),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Creates an in-memory database
    pub fn new_in_memory(table_prefix: &str) -> StorageResult<Self> {
        let mut store = Self {
            conn: Connection::open_in_memory()?,
            table: table_name(table_prefix),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Snapshot counts grouped by stored status line, most frequent first
    pub fn count_by_status(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT COALESCE(url_status, ''), COUNT(*) FROM \"{}\"
             GROUP BY url_status ORDER BY COUNT(*) DESC, url_status",
            self.table
        ))?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    /// Oldest and newest capture dates, if any snapshot exists
    pub fn capture_range(&self) -> StorageResult<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        let (oldest, newest): (Option<String>, Option<String>) = self.conn.query_row(
            &format!("SELECT MIN(url_date), MAX(url_date) FROM \"{}\"", self.table),
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        match (oldest, newest) {
            (Some(oldest), Some(newest)) => {
                let parse = |value: &str| {
                    parse_timestamp(value)
                        .ok_or_else(|| StorageError::CorruptRecord(format!("date {:?}", value)))
                };
                Ok(Some((parse(&oldest)?, parse(&newest)?)))
            }
            _ => Ok(None),
        }
    }
}

impl SnapshotStore for SqliteStore {
    fn ensure_schema(&mut self) -> StorageResult<()> {
        tracing::debug!("Ensuring snapshot table {}", self.table);
        initialize_schema(&self.conn, &self.table)?;
        Ok(())
    }

    fn contains(&self, key: &SnapshotKey) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                &format!("SELECT 1 FROM \"{}\" WHERE url_hash = ?1 LIMIT 1", self.table),
                params![&key.as_bytes()[..]],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn put(&mut self, url: &str, capture: &Capture) -> StorageResult<bool> {
        let key = SnapshotKey::from_url(url);
        let headers = serde_json::to_string(&capture.headers)?;
        let cookies = serde_json::to_string(&capture.cookies)?;
        let now = Utc::now().to_rfc3339();

        let inserted = self.conn.execute(
            &format!(
                "INSERT OR IGNORE INTO \"{}\"
                 (url_hash, url_date, url_url, url_status, url_headers, url_cookies, url_content)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                self.table
            ),
            params![
                &key.as_bytes()[..],
                now,
                url,
                capture.status_line,
                headers,
                cookies,
                capture.body
            ],
        )?;

        Ok(inserted == 1)
    }

    fn get(&self, url: &str) -> StorageResult<Option<SnapshotRecord>> {
        let key = SnapshotKey::from_url(url);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT url_hash, url_date, url_url, url_status, url_headers, url_cookies, url_content
             FROM \"{}\" WHERE url_hash = ?1",
            self.table
        ))?;

        let row = stmt
            .query_row(params![&key.as_bytes()[..]], |row| {
                Ok((
                    row.get::<_, Vec<u8>>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<Vec<u8>>>(6)?,
                ))
            })
            .optional()?;

        let Some((hash, date, stored_url, status, headers, cookies, body)) = row else {
            return Ok(None);
        };

        let key = SnapshotKey::from_slice(&hash)
            .ok_or_else(|| StorageError::CorruptRecord(hex::encode(&hash)))?;
        let captured_at = parse_timestamp(&date)
            .ok_or_else(|| StorageError::CorruptRecord(format!("{} (date {:?})", key, date)))?;

        Ok(Some(SnapshotRecord {
            key,
            url: stored_url,
            captured_at,
            status_line: status.unwrap_or_default(),
            headers: decode_pairs(headers.as_deref())?,
            cookies: decode_pairs(cookies.as_deref())?,
            body: body.unwrap_or_default(),
        }))
    }

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", self.table),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

/// Accepts RFC 3339 (what we write) and SQLite's CURRENT_TIMESTAMP format
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn decode_pairs(value: Option<&str>) -> StorageResult<Vec<(String, String)>> {
    match value {
        Some(json) if !json.is_empty() => Ok(serde_json::from_str(json)?),
        _ => Ok(Vec::new()),
    }
}
