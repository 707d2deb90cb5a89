use crate::config::types::{
    ArchiveConfig, Config, DocumentsConfig, FetchConfig, ScheduleConfig, SiteConfig,
    StorageConfig,
};
use crate::ConfigError;
use url::Url;

/// Upper bound accepted for `max-redirects`
const MAX_REDIRECT_LIMIT: u32 = 20;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_fetch_config(&config.fetch)?;
    validate_archive_config(&config.archive)?;
    validate_storage_config(&config.storage)?;
    validate_documents_config(&config.documents)?;
    validate_schedule_config(&config.schedule)?;
    Ok(())
}

/// Returns the lowercase host of the configured site URL
///
/// This is the host the URL filter refuses to snapshot.
pub fn site_host(config: &Config) -> Result<String, ConfigError> {
    let url = parse_http_url("site.url", &config.site.url)?;
    url.host_str()
        .map(|h| h.to_lowercase())
        .ok_or_else(|| ConfigError::InvalidUrl(format!("site.url '{}' has no host", url)))
}

fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = parse_http_url("site.url", &config.url)?;
    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(ConfigError::InvalidUrl(format!(
            "site.url '{}' has no host",
            config.url
        )));
    }
    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.max_redirects > MAX_REDIRECT_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-redirects must be <= {}, got {}",
            MAX_REDIRECT_LIMIT, config.max_redirects
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_archive_config(config: &ArchiveConfig) -> Result<(), ConfigError> {
    if config.enabled {
        parse_http_url("archive.endpoint", &config.endpoint)?;
    }
    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    // The prefix ends up inside DDL, so keep it to identifier characters
    if !config
        .table_prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "table-prefix must contain only ASCII letters, digits and '_', got '{}'",
            config.table_prefix
        )));
    }

    Ok(())
}

fn validate_documents_config(config: &DocumentsConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "documents.path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_schedule_config(config: &ScheduleConfig) -> Result<(), ConfigError> {
    if config.batch_interval_secs < 60 {
        return Err(ConfigError::Validation(format!(
            "batch-interval-secs must be >= 60, got {}",
            config.batch_interval_secs
        )));
    }
    Ok(())
}

fn parse_http_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(url)
}
