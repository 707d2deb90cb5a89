//! Integration tests against mock HTTP servers
//!
//! These use wiremock to exercise the live fetcher, the archive fallback
//! and full batch passes end-to-end.

mod archive_tests;
mod fetch_tests;
mod pipeline_tests;

use url2snapshot::config::FetchConfig;
use url2snapshot::crawler::HttpFetcher;

/// Live fetcher with short timeouts for tests
pub fn test_fetcher() -> HttpFetcher {
    let config = FetchConfig {
        timeout_secs: 1,
        connect_timeout_secs: 1,
        ..FetchConfig::default()
    };
    HttpFetcher::new(&config).expect("Failed to build HTTP client")
}
