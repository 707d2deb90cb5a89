//! Candidate URL filtering
//!
//! Extracted candidates pass through, in order:
//! 1. the optional [`UrlHook`] (external collaborators may add or drop URLs)
//! 2. escaping; anything that escapes to the empty string is dropped
//! 3. the site-host and loopback checks
//! 4. deduplication

use crate::url::domain::{extract_host, is_loopback};
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// Extension point for adjusting a document's candidate URLs
///
/// Implemented for any `Fn(&str, Vec<String>) -> Vec<String>` closure; the
/// first argument is the document identifier.
pub trait UrlHook: Send + Sync {
    fn adjust(&self, document_id: &str, urls: Vec<String>) -> Vec<String>;
}

impl<F> UrlHook for F
where
    F: Fn(&str, Vec<String>) -> Vec<String> + Send + Sync,
{
    fn adjust(&self, document_id: &str, urls: Vec<String>) -> Vec<String> {
        self(document_id, urls)
    }
}

/// Characters kept by [`escape_url`] besides ASCII alphanumerics
const URL_SAFE_PUNCTUATION: &str = "-~+_.?#=!&;,/:%@$|*'()[]";

/// Cleans a raw URL string for storage and fetching
///
/// Whitespace and characters that never belong in a URL are removed. The
/// result is the empty string when the URL is not http(s) or does not parse.
///
/// # Examples
///
/// ```
/// use url2snapshot::url::escape_url;
///
/// assert_eq!(escape_url(" http://example.com/a b "), "http://example.com/ab");
/// assert_eq!(escape_url("javascript:alert(1)"), "");
/// ```
pub fn escape_url(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| {
            c.is_ascii_alphanumeric() || URL_SAFE_PUNCTUATION.contains(*c) || !c.is_ascii()
        })
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();

    match Url::parse(&cleaned) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => cleaned,
        _ => String::new(),
    }
}

/// Decides whether a single URL may be snapshotted
///
/// Returns false when the URL escapes to the empty string, when its host
/// is `site_host`, or when its host is a loopback address.
pub fn admit(url: &str, site_host: &str) -> bool {
    let escaped = escape_url(url);
    if escaped.is_empty() {
        return false;
    }

    let parsed = match Url::parse(&escaped) {
        Ok(u) => u,
        Err(_) => return false,
    };

    if is_loopback(&parsed) {
        return false;
    }

    match extract_host(&parsed) {
        Some(host) => !host.eq_ignore_ascii_case(site_host),
        None => false,
    }
}

/// Filter bound to one site, with an optional candidate hook
pub struct UrlFilter {
    site_host: String,
    hook: Option<Box<dyn UrlHook>>,
}

impl UrlFilter {
    pub fn new(site_host: impl Into<String>) -> Self {
        Self {
            site_host: site_host.into().to_lowercase(),
            hook: None,
        }
    }

    /// Installs a hook that sees the raw candidates before any filtering
    pub fn with_hook(mut self, hook: impl UrlHook + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn admit(&self, url: &str) -> bool {
        admit(url, &self.site_host)
    }

    /// Runs the full filter over a document's candidates
    ///
    /// Returns escaped, admitted, unique URLs in first-occurrence order.
    pub fn filter(&self, document_id: &str, candidates: Vec<String>) -> Vec<String> {
        let candidates = match &self.hook {
            Some(hook) => hook.adjust(document_id, candidates),
            None => candidates,
        };

        let mut seen = HashSet::new();
        let mut admitted = Vec::new();

        for candidate in candidates {
            let escaped = escape_url(&candidate);
            if escaped.is_empty() {
                tracing::trace!("Dropping {:?}: empty after escaping", candidate);
                continue;
            }

            if !self.admit(&escaped) {
                tracing::trace!("Dropping {}: own site or loopback", escaped);
                continue;
            }

            if seen.insert(escaped.clone()) {
                admitted.push(escaped);
            }
        }

        admitted
    }
}

impl fmt::Debug for UrlFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlFilter")
            .field("site_host", &self.site_host)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}
