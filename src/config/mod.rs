//! Configuration module for url2snapshot
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use url2snapshot::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("url2snapshot.toml")).unwrap();
//! println!("Snapshots go to: {}", config.storage.database_path);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ArchiveConfig, Config, DocumentsConfig, FetchConfig, LoggingConfig, ScheduleConfig,
    SiteConfig, StorageConfig, DEFAULT_ARCHIVE_ENDPOINT, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{site_host, validate};
