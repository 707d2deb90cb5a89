//! Database schema definitions
//!
//! One table, keyed by the 20-byte SHA-1 of the URL. The table name is
//! `<prefix>urlsnapshots`; the prefix is validated to identifier characters
//! before it gets here.

/// Base table name, appended to the configured prefix
pub const TABLE_BASE_NAME: &str = "urlsnapshots";

/// Builds the full table name for a prefix
pub fn table_name(prefix: &str) -> String {
    format!("{}{}", prefix, TABLE_BASE_NAME)
}

/// SQL creating the snapshot table if it is absent
pub fn schema_sql(table: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS "{table}" (
    url_hash BLOB NOT NULL PRIMARY KEY CHECK (length(url_hash) = 20),
    url_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    url_url TEXT NOT NULL,
    url_status TEXT,
    url_headers TEXT,
    url_cookies TEXT,
    url_content BLOB
);
"#
    )
}

/// Creates the snapshot table; safe to call on every start
pub fn initialize_schema(conn: &rusqlite::Connection, table: &str) -> Result<(), rusqlite::Error> {
    conn.execute_batch(&schema_sql(table))?;
    Ok(())
}
