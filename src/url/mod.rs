//! URL handling module for url2snapshot
//!
//! This module finds candidate links in document text and decides which of
//! them are worth snapshotting.

mod domain;
mod extract;
mod filter;

pub use domain::{extract_host, is_loopback};
pub use extract::extract_urls;
pub use filter::{admit, escape_url, UrlFilter, UrlHook};

use crate::{UrlError, UrlResult};
use url::Url;

/// Parses an http(s) URL, rejecting other schemes and host-less URLs
pub fn parse_http_url(raw: &str) -> UrlResult<Url> {
    let url = Url::parse(raw).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}
