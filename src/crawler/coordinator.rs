//! Snapshot coordinator - per-document orchestration
//!
//! Every admitted URL goes through the same sequence:
//!
//! ```text
//! CheckExists ─ exists ─────────────────────────────► Done
//!      │ absent
//!      ▼
//!    Fetch ─ Success ────────────────────► Persist ─► Done
//!      ├──── ClientError ─► Fallback ─ Success ─► Persist ─► Done
//!      │                        └─ failure ─────────► Done (not stored)
//!      └──── ServerError | TransportError | NonText ─► Done (not stored)
//! ```
//!
//! Nothing is retried inside a pass; URLs that were not stored are simply
//! picked up again by the next pass. Failures of one URL never stop its
//! siblings or the rest of the batch.

use crate::config::{site_host, Config};
use crate::crawler::archive::ArchiveFallback;
use crate::crawler::fetcher::{Capture, Fetch, FetchOutcome, HttpFetcher};
use crate::documents::{CachedSource, DirectorySource, Document, DocumentSource};
use crate::output::PassStats;
use crate::storage::{SnapshotStore, SqliteStore};
use crate::url::{extract_urls, UrlFilter};
use crate::Result;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Where a single URL ended up after one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlDisposition {
    /// A record already existed; nothing fetched
    AlreadySnapshotted,
    /// Live capture stored
    Snapshotted,
    /// Archive capture stored after a client error
    Archived,
    /// 200 with a non-text content type; skipped
    NotText,
    /// 5xx; left for the next pass
    ServerError,
    /// Network or protocol failure; left for the next pass
    TransportError,
    /// 4xx with the archive fallback disabled
    ClientError,
    /// 4xx and the archive had nothing usable
    ArchiveMiss,
    /// Fetched fine but the insert failed
    StoreFailed,
}

impl UrlDisposition {
    /// True when this pass wrote a record
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Snapshotted | Self::Archived)
    }
}

/// Per-document result of a pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentReport {
    pub document_id: String,
    /// Raw extractor hits, duplicates included
    pub candidates: usize,
    /// Admitted URLs in processing order, each with its disposition
    pub urls: Vec<(String, UrlDisposition)>,
}

impl DocumentReport {
    /// Number of URLs this pass wrote a record for
    pub fn stored(&self) -> usize {
        self.urls.iter().filter(|(_, d)| d.is_stored()).count()
    }

    pub fn disposition(&self, url: &str) -> Option<UrlDisposition> {
        self.urls
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, d)| *d)
    }
}

/// Drives documents through extraction, filtering, fetching and storage
pub struct Snapshotter<S> {
    filter: UrlFilter,
    fetcher: Arc<dyn Fetch>,
    archive: Option<ArchiveFallback>,
    store: Arc<Mutex<S>>,
    documents: Arc<dyn DocumentSource>,
}

impl Snapshotter<SqliteStore> {
    /// Wires up the live stack described by `config`
    ///
    /// Opens (and if needed creates) the snapshot database, builds the HTTP
    /// client and the cached directory repository.
    pub fn from_config(config: &Config) -> Result<Self> {
        let host = site_host(config)?;
        let fetcher: Arc<dyn Fetch> = Arc::new(HttpFetcher::new(&config.fetch)?);

        let store = SqliteStore::new(
            Path::new(&config.storage.database_path),
            &config.storage.table_prefix,
        )?;

        let documents = CachedSource::new(
            DirectorySource::new(&config.documents.path),
            Duration::from_secs(config.documents.cache_ttl_secs),
        );

        let mut snapshotter = Self::new(
            UrlFilter::new(host),
            fetcher.clone(),
            Arc::new(Mutex::new(store)),
            Arc::new(documents),
        );

        if config.archive.enabled {
            snapshotter =
                snapshotter.with_archive(ArchiveFallback::new(fetcher, &config.archive.endpoint));
        }

        Ok(snapshotter)
    }
}

impl<S: SnapshotStore> Snapshotter<S> {
    /// Creates a snapshotter without archive fallback
    pub fn new(
        filter: UrlFilter,
        fetcher: Arc<dyn Fetch>,
        store: Arc<Mutex<S>>,
        documents: Arc<dyn DocumentSource>,
    ) -> Self {
        Self {
            filter,
            fetcher,
            archive: None,
            store,
            documents,
        }
    }

    pub fn with_archive(mut self, archive: ArchiveFallback) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Processes every document the repository reports
    ///
    /// Only a failure to list documents is returned as an error; documents
    /// that fail to render are logged and counted.
    ///
    /// # Returns
    ///
    /// * `Ok(PassStats)` - Totals over every document in the pass
    /// * `Err(SnapshotError)` - The document repository could not be listed
    pub async fn run_batch(&self) -> Result<PassStats> {
        let ids = self.documents.list_ids()?;
        tracing::info!("Batch pass started: {} documents", ids.len());

        let mut stats = PassStats::default();
        for id in ids {
            match self.documents.render(&id) {
                Ok(document) => {
                    let report = self.process_document(&document).await;
                    stats.add_document(&report);
                }
                Err(e) => {
                    tracing::warn!("Skipping document {}: {}", id, e);
                    stats.documents_failed += 1;
                }
            }
        }

        stats.log_summary("batch");
        Ok(stats)
    }

    /// Processes one already-rendered document
    pub async fn run_single(&self, document: &Document) -> PassStats {
        let report = self.process_document(document).await;
        let mut stats = PassStats::default();
        stats.add_document(&report);
        stats.log_summary("standalone");
        stats
    }

    /// Renders a document by id and processes it
    pub async fn run_single_id(&self, id: &str) -> Result<PassStats> {
        let document = self.documents.render(id)?;
        Ok(self.run_single(&document).await)
    }

    /// Extracts, filters and processes the links of one document
    pub async fn process_document(&self, document: &Document) -> DocumentReport {
        tracing::debug!("Processing document {}", document.id);

        let candidates = extract_urls(&document.body);
        let candidate_count = candidates.len();
        let urls = self.filter.filter(&document.id, candidates);

        tracing::debug!(
            "Document {}: {} candidates, {} admitted",
            document.id,
            candidate_count,
            urls.len()
        );

        let mut report = DocumentReport {
            document_id: document.id.clone(),
            candidates: candidate_count,
            urls: Vec::with_capacity(urls.len()),
        };

        for url in urls {
            let disposition = self.process_url(&url).await;
            report.urls.push((url, disposition));
        }

        tracing::debug!(
            "Document {}: {} of {} admitted urls stored this pass",
            report.document_id,
            report.stored(),
            report.urls.len()
        );
        report
    }

    /// Runs one URL through check → fetch → fallback → persist
    ///
    /// # Arguments
    ///
    /// * `url` - An admitted URL, exactly as it will be keyed in the store
    ///
    /// # Returns
    ///
    /// Where the URL ended up. Never fails: store and network problems are
    /// reported as dispositions.
    pub async fn process_url(&self, url: &str) -> UrlDisposition {
        if self.exists(url) {
            tracing::debug!("{} is already snapshotted", url);
            return UrlDisposition::AlreadySnapshotted;
        }

        tracing::debug!("{} not yet snapshotted, fetching", url);
        let disposition = match self.fetcher.fetch(url).await {
            FetchOutcome::Success(capture) => self.persist(url, &capture, false),
            FetchOutcome::ClientError { status } => self.fall_back(url, status).await,
            FetchOutcome::ServerError { status } => {
                tracing::info!("{} answered {}, leaving it for the next pass", url, status);
                UrlDisposition::ServerError
            }
            FetchOutcome::NonTextContent { content_type } => {
                tracing::info!("{} is {}, probably not text; skipping", url, content_type);
                UrlDisposition::NotText
            }
            FetchOutcome::TransportError { reason } => {
                tracing::warn!("Retrieving {} failed: {}", url, reason);
                UrlDisposition::TransportError
            }
            FetchOutcome::Redirect { location } => {
                // fetchers follow redirects themselves; a leaked one is a failure
                tracing::warn!("Unfollowed redirect from {} to {}", url, location);
                UrlDisposition::TransportError
            }
        };

        tracing::debug!("{} -> {:?}", url, disposition);
        disposition
    }

    async fn fall_back(&self, url: &str, status: u16) -> UrlDisposition {
        let Some(archive) = &self.archive else {
            tracing::info!("{} answered {}, archive fallback disabled", url, status);
            return UrlDisposition::ClientError;
        };

        tracing::info!("{} answered {}, trying the archive", url, status);
        match archive.recover(url).await {
            FetchOutcome::Success(capture) => self.persist(url, &capture, true),
            _ => UrlDisposition::ArchiveMiss,
        }
    }

    fn exists(&self, url: &str) -> bool {
        match self.store.lock() {
            Ok(store) => store.exists(url),
            Err(_) => {
                tracing::error!("Snapshot store lock poisoned; treating {} as absent", url);
                false
            }
        }
    }

    fn persist(&self, url: &str, capture: &Capture, archived: bool) -> UrlDisposition {
        let result = match self.store.lock() {
            Ok(mut store) => store.put(url, capture),
            Err(_) => {
                tracing::error!("Snapshot store lock poisoned; cannot store {}", url);
                return UrlDisposition::StoreFailed;
            }
        };

        match result {
            Ok(true) => {
                tracing::info!(
                    "Snapshotted {} ({} bytes{})",
                    url,
                    capture.body.len(),
                    if archived { ", from archive" } else { "" }
                );
                if archived {
                    UrlDisposition::Archived
                } else {
                    UrlDisposition::Snapshotted
                }
            }
            Ok(false) => {
                tracing::debug!("{} was stored concurrently", url);
                UrlDisposition::AlreadySnapshotted
            }
            Err(e) => {
                tracing::error!("Storing snapshot of {} failed: {}", url, e);
                UrlDisposition::StoreFailed
            }
        }
    }
}
