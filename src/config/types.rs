use serde::Deserialize;

/// Browser-like user agent; some hosts refuse obvious bots outright.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:42.0) Gecko/20100101 Firefox/42.0";

/// Wayback availability endpoint
pub const DEFAULT_ARCHIVE_ENDPOINT: &str = "https://archive.org/wayback/available";

/// Main configuration structure for url2snapshot
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Builds a configuration with defaults for everything but the site URL
    pub fn for_site(url: &str) -> Self {
        Self {
            site: SiteConfig {
                url: url.to_string(),
            },
            fetch: FetchConfig::default(),
            archive: ArchiveConfig::default(),
            storage: StorageConfig::default(),
            documents: DocumentsConfig::default(),
            schedule: ScheduleConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// The site whose documents are scanned
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Public URL of the site; links to its own host are never snapshotted
    pub url: String,
}

/// Outbound fetch policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Total request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Redirect hops followed before the chain is abandoned
    #[serde(rename = "max-redirects")]
    pub max_redirects: u32,

    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            connect_timeout_secs: 5,
            max_redirects: 6,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Archive fallback settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub enabled: bool,

    /// Availability endpoint; the target URL is passed as the `url` parameter
    pub endpoint: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_ARCHIVE_ENDPOINT.to_string(),
        }
    }
}

/// Snapshot database settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Prepended to `urlsnapshots` to form the table name
    #[serde(rename = "table-prefix")]
    pub table_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "./url2snapshot.db".to_string(),
            table_prefix: "wp_".to_string(),
        }
    }
}

/// Document repository settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Directory holding one document per file
    pub path: String,

    /// How long a rendered document stays cached (seconds)
    #[serde(rename = "cache-ttl-secs")]
    pub cache_ttl_secs: u64,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            path: "./documents".to_string(),
            cache_ttl_secs: 10,
        }
    }
}

/// Trigger timing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Interval between full batch passes (seconds)
    #[serde(rename = "batch-interval-secs")]
    pub batch_interval_secs: u64,

    /// Delay between a publish transition and its standalone run (seconds)
    #[serde(rename = "publish-delay-secs")]
    pub publish_delay_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            batch_interval_secs: 24 * 60 * 60,
            publish_delay_secs: 120,
        }
    }
}

/// Minimum log severity when no CLI flag or RUST_LOG overrides it
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
