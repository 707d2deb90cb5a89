//! url2snapshot: link-rot insurance for a document corpus
//!
//! This crate scans documents for outbound links and stores a one-time
//! snapshot of whatever each link pointed to, falling back to a wayback-style
//! archive when the live page answers with a client error.

pub mod config;
pub mod crawler;
pub mod documents;
pub mod output;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for url2snapshot operations
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Document error for {id}: {message}")]
    Document { id: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for url2snapshot operations
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{FetchOutcome, Snapshotter, UrlDisposition};
pub use documents::Document;
pub use storage::{SnapshotKey, SnapshotRecord, SnapshotStore, SqliteStore};
pub use url::{admit, extract_urls, UrlFilter};
