//! Fetching, archive fallback and pass orchestration
//!
//! - `fetcher`: one-shot HTTP retrieval and response classification
//! - `archive`: wayback-style lookup for pages that answer with a 4xx
//! - `coordinator`: the per-document, per-URL snapshot pipeline
//! - `scheduler`: periodic batches and publish-triggered single passes

mod archive;
mod coordinator;
mod fetcher;
mod scheduler;

#[cfg(test)]
pub(crate) mod test_support;

pub use archive::{parse_availability, raw_capture_url, ArchiveFallback, ArchiveMiss, ClosestSnapshot};
pub use coordinator::{DocumentReport, Snapshotter, UrlDisposition};
pub use fetcher::{
    build_http_client, classify, is_text_mime, Capture, Classified, Fetch, FetchOutcome,
    HttpFetcher,
};
pub use scheduler::{triggers_snapshot, PublishState, Scheduler};
