//! Wayback-style archive fallback
//!
//! When a live URL answers with a client error, the archive's availability
//! API is asked for the closest capture. A usable answer looks like:
//!
//! ```json
//! {"archived_snapshots": {"closest": {
//!     "available": true, "status": "200",
//!     "url": "http://web.archive.org/web/20130919044612/http://example.com/",
//!     "timestamp": "20130919044612"}}}
//! ```
//!
//! The capture is then fetched with `id_` appended to the timestamp, which
//! asks the archive for the original bytes instead of its replay page.

use crate::crawler::fetcher::{Fetch, FetchOutcome};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Reasons an archive lookup produced nothing usable
#[derive(Debug, Error)]
pub enum ArchiveMiss {
    #[error("availability endpoint unusable: {0}")]
    Endpoint(String),

    #[error("availability lookup failed ({0})")]
    Lookup(&'static str),

    #[error("malformed availability response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("no closest snapshot")]
    NoSnapshot,

    #[error("closest snapshot not available")]
    NotAvailable,

    #[error("closest snapshot status is not 200")]
    BadStatus,

    #[error("closest snapshot has no url or timestamp")]
    Incomplete,

    #[error("snapshot url {0} does not contain its timestamp")]
    Unrewritable(String),
}

/// The archive's closest capture of a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosestSnapshot {
    pub url: String,
    pub timestamp: String,
}

impl ClosestSnapshot {
    /// URL of the unmodified capture (`<timestamp>id_`)
    pub fn raw_url(&self) -> Result<String, ArchiveMiss> {
        raw_capture_url(&self.url, &self.timestamp)
            .ok_or_else(|| ArchiveMiss::Unrewritable(self.url.clone()))
    }
}

/// Inserts `id_` right after the timestamp segment of a snapshot URL
///
/// # Examples
///
/// ```
/// use url2snapshot::crawler::raw_capture_url;
///
/// assert_eq!(
///     raw_capture_url("http://web.archive.org/web/20130919044612/http://example.com/", "20130919044612")
///         .as_deref(),
///     Some("http://web.archive.org/web/20130919044612id_/http://example.com/")
/// );
/// ```
pub fn raw_capture_url(snapshot_url: &str, timestamp: &str) -> Option<String> {
    if timestamp.is_empty() {
        return None;
    }

    let insert_at = match snapshot_url.find(&format!("/{}/", timestamp)) {
        Some(pos) => pos + 1 + timestamp.len(),
        None => snapshot_url.find(timestamp)? + timestamp.len(),
    };

    let mut raw = String::with_capacity(snapshot_url.len() + 3);
    raw.push_str(&snapshot_url[..insert_at]);
    raw.push_str("id_");
    raw.push_str(&snapshot_url[insert_at..]);
    Some(raw)
}

/// Parses an availability response body
pub fn parse_availability(body: &[u8]) -> Result<ClosestSnapshot, ArchiveMiss> {
    let json: Value = serde_json::from_slice(body)?;

    let closest = json
        .get("archived_snapshots")
        .and_then(|s| s.get("closest"))
        .filter(|c| c.is_object())
        .ok_or(ArchiveMiss::NoSnapshot)?;

    let available = match closest.get("available") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    };
    if !available {
        return Err(ArchiveMiss::NotAvailable);
    }

    let status_ok = match closest.get("status") {
        Some(Value::Number(n)) => n.as_u64() == Some(200),
        Some(Value::String(s)) => s.trim() == "200",
        _ => false,
    };
    if !status_ok {
        return Err(ArchiveMiss::BadStatus);
    }

    let url = closest
        .get("url")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
        .ok_or(ArchiveMiss::Incomplete)?;

    let timestamp = match closest.get("timestamp") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(ArchiveMiss::Incomplete),
    };

    Ok(ClosestSnapshot {
        url: url.to_string(),
        timestamp,
    })
}

/// Recovers dead links from a wayback-style archive
pub struct ArchiveFallback {
    fetcher: Arc<dyn Fetch>,
    endpoint: String,
}

impl ArchiveFallback {
    /// Uses `fetcher` for both the lookup and the capture download
    pub fn new(fetcher: Arc<dyn Fetch>, endpoint: impl Into<String>) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.into(),
        }
    }

    /// Availability query URL for `url`
    pub fn lookup_url(&self, url: &str) -> Result<String, ArchiveMiss> {
        Url::parse_with_params(&self.endpoint, &[("url", url)])
            .map(String::from)
            .map_err(|e| ArchiveMiss::Endpoint(e.to_string()))
    }

    /// Asks the archive for the closest usable capture of `url`
    pub async fn closest(&self, url: &str) -> Result<ClosestSnapshot, ArchiveMiss> {
        let lookup = self.lookup_url(url)?;

        match self.fetcher.fetch(&lookup).await {
            FetchOutcome::Success(capture) => parse_availability(&capture.body),
            other => Err(ArchiveMiss::Lookup(other.label())),
        }
    }

    /// Fetches the archived copy of `url`
    ///
    /// Anything other than `Success` means nothing should be stored. There
    /// is no further fallback from here.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL the document links to, not any redirect target
    ///
    /// # Returns
    ///
    /// * `FetchOutcome::Success` - The unmodified archived capture
    /// * `FetchOutcome::TransportError` - Lookup failed or no usable capture exists
    /// * any other outcome - Passed through from fetching the capture itself
    pub async fn recover(&self, url: &str) -> FetchOutcome {
        tracing::debug!("Trying archive copy of {}", url);

        let raw_url = match self.closest(url).await.and_then(|s| s.raw_url()) {
            Ok(raw) => raw,
            Err(miss) => {
                tracing::info!("No archive copy of {}: {}", url, miss);
                return FetchOutcome::transport(format!("archive: {}", miss));
            }
        };

        tracing::debug!("Fetching archived capture {}", raw_url);
        let outcome = self.fetcher.fetch(&raw_url).await;
        if outcome.is_success() {
            tracing::info!("Found archive copy of {} at {}", url, raw_url);
        } else {
            tracing::info!(
                "Archive copy of {} at {} failed: {}",
                url,
                raw_url,
                outcome.label()
            );
        }
        outcome
    }
}
