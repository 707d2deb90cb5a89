//! HTTP fetcher implementation
//!
//! This module handles every outbound request, including:
//! - Building the HTTP client with the configured timeouts and user agent
//! - Following redirects by hand, one classified hop at a time
//! - Classifying responses into [`FetchOutcome`]s
//!
//! Redirects are never followed by reqwest itself. The hop counter is a
//! local of each top-level [`Fetch::fetch`] call, so concurrent chains
//! cannot see each other's counts.

use crate::config::FetchConfig;
use crate::url::parse_http_url;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{redirect::Policy, Client};
use std::borrow::Cow;
use std::time::Duration;

/// Content types worth keeping; matched case-insensitively as substrings
const TEXT_MIME_MARKERS: &[&str] = &["text/", "application/json", "application/javascript"];

/// A successful capture of one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// HTTP status code (always 200 for a live capture)
    pub status: u16,
    /// Response line, e.g. `HTTP/1.1 200 OK`
    pub status_line: String,
    /// Response headers grouped by name in first-seen order, repeats kept
    pub headers: Vec<(String, String)>,
    /// Cookies set by the response, in header order
    pub cookies: Vec<(String, String)>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl Capture {
    /// First value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Result of one fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 200 with a text-like content type
    Success(Capture),

    /// 4xx; the caller may try the archive
    ClientError { status: u16 },

    /// 5xx; assumed transient, left for the next pass
    ServerError { status: u16 },

    /// 3xx with a location; only seen between hops, never returned by `fetch`
    Redirect { location: String },

    /// 200 but not text; skipped, not an error
    NonTextContent { content_type: String },

    /// Network failure, malformed response, redirect limit, unhandled status
    TransportError { reason: String },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        Self::TransportError {
            reason: reason.into(),
        }
    }

    /// Short name for log lines
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::ClientError { .. } => "client-error",
            Self::ServerError { .. } => "server-error",
            Self::Redirect { .. } => "redirect",
            Self::NonTextContent { .. } => "non-text",
            Self::TransportError { .. } => "transport-error",
        }
    }
}

/// Anything that can turn a URL into a [`FetchOutcome`]
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetches a URL, following redirects internally
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// What to do with a response after looking at its status and headers
#[derive(Debug, PartialEq, Eq)]
pub enum Classified {
    /// Read the body and return `Success`
    Capture,
    /// Stop here with this outcome (`Redirect` means follow it)
    Outcome(FetchOutcome),
}

/// Returns true for content types that are worth snapshotting
pub fn is_text_mime(content_type: &str) -> bool {
    let lowered = content_type.to_ascii_lowercase();
    TEXT_MIME_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Classifies a response from its status code and headers
///
/// Rules, first match wins:
///
/// | Condition | Result |
/// |-----------|--------|
/// | No headers | TransportError |
/// | No or empty `content-type` | TransportError |
/// | 400..=499 | ClientError |
/// | 500..=599 | ServerError |
/// | 300..=399 with `location` | Redirect |
/// | 200, text-like type | Capture |
/// | 200, other type | NonTextContent |
/// | anything else | TransportError |
pub fn classify(status: u16, headers: &[(String, String)]) -> Classified {
    if headers.is_empty() {
        return Classified::Outcome(FetchOutcome::transport("response carried no headers"));
    }

    let content_type = match find_header(headers, "content-type").map(str::trim) {
        Some(ct) if !ct.is_empty() => ct,
        _ => {
            return Classified::Outcome(FetchOutcome::transport("missing content-type"));
        }
    };

    match status {
        400..=499 => Classified::Outcome(FetchOutcome::ClientError { status }),
        500..=599 => Classified::Outcome(FetchOutcome::ServerError { status }),
        300..=399 => match find_header(headers, "location").map(str::trim) {
            Some(location) if !location.is_empty() => {
                Classified::Outcome(FetchOutcome::Redirect {
                    location: location.to_string(),
                })
            }
            _ => Classified::Outcome(FetchOutcome::transport(format!(
                "HTTP {} without location",
                status
            ))),
        },
        200 if is_text_mime(content_type) => Classified::Capture,
        200 => Classified::Outcome(FetchOutcome::NonTextContent {
            content_type: content_type.to_string(),
        }),
        other => Classified::Outcome(FetchOutcome::transport(format!(
            "unhandled HTTP status {}",
            other
        ))),
    }
}

/// Builds an HTTP client with the configured fetch policy
///
/// Redirects are disabled so that every hop goes through [`classify`].
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::none()) // Handle redirects manually
        .http1_only()
        .gzip(true)
        .brotli(true)
        .build()
}

/// Live HTTP implementation of [`Fetch`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_redirects: u32,
}

impl HttpFetcher {
    /// Creates a fetcher from the fetch settings
    ///
    /// # Arguments
    ///
    /// * `config` - Timeouts, redirect limit and user agent
    ///
    /// # Returns
    ///
    /// * `Ok(HttpFetcher)` - Client built with redirects disabled
    /// * `Err(reqwest::Error)` - The TLS backend or client could not be initialized
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            max_redirects: config.max_redirects,
        })
    }

    /// Follows a redirect chain starting at `url`, `hops` already taken
    async fn fetch_chain(&self, url: &str, mut hops: u32) -> FetchOutcome {
        let mut current = url.to_string();

        loop {
            match self.fetch_once(&current).await {
                FetchOutcome::Redirect { location } => {
                    if hops >= self.max_redirects {
                        tracing::debug!(
                            "Giving up on {} after {} redirects (at {})",
                            url,
                            hops,
                            current
                        );
                        return FetchOutcome::transport(format!(
                            "redirect limit of {} exceeded",
                            self.max_redirects
                        ));
                    }

                    let next = match resolve_location(&current, &location) {
                        Some(next) => next,
                        None => {
                            return FetchOutcome::transport(format!(
                                "unusable redirect location {:?}",
                                location
                            ));
                        }
                    };

                    hops += 1;
                    tracing::debug!("Redirect hop {} for {}: {} -> {}", hops, url, current, next);
                    current = next;
                }
                outcome => return outcome,
            }
        }
    }

    /// One request, no redirect handling
    async fn fetch_once(&self, url: &str) -> FetchOutcome {
        if let Err(e) = parse_http_url(url) {
            return FetchOutcome::transport(format!("invalid URL {}: {}", url, e));
        }

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                let reason = if e.is_timeout() {
                    "request timeout".to_string()
                } else if e.is_connect() {
                    format!("connection failed: {}", e)
                } else {
                    e.to_string()
                };
                tracing::debug!("Retrieving {} failed: {}", url, reason);
                return FetchOutcome::TransportError { reason };
            }
        };

        let status = response.status();
        let headers = header_pairs(response.headers());

        match classify(status.as_u16(), &headers) {
            Classified::Outcome(outcome) => {
                tracing::debug!("{} answered {}: {}", url, status, outcome.label());
                outcome
            }
            Classified::Capture => {
                let status_line = format!("{:?} {}", response.version(), status);
                let cookies: Vec<(String, String)> = response
                    .cookies()
                    .map(|c| (c.name().to_string(), c.value().to_string()))
                    .collect();

                match response.bytes().await {
                    Ok(body) => FetchOutcome::Success(Capture {
                        status: status.as_u16(),
                        status_line,
                        headers,
                        cookies,
                        body: body.to_vec(),
                    }),
                    Err(e) => {
                        tracing::debug!("Reading body of {} failed: {}", url, e);
                        FetchOutcome::transport(format!("body read failed: {}", e))
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        self.fetch_chain(url, 0).await
    }
}

/// Resolves a `location` header against the URL that sent it
fn resolve_location(current: &str, location: &str) -> Option<String> {
    let base = parse_http_url(current).ok()?;
    let next = base.join(location).ok()?;
    matches!(next.scheme(), "http" | "https").then(|| next.to_string())
}

/// Flattens a header map, grouped by name in first-seen order
fn header_pairs(map: &HeaderMap) -> Vec<(String, String)> {
    map.iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
