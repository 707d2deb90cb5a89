//! Pass counters and snapshot database statistics

use crate::crawler::{DocumentReport, UrlDisposition};
use crate::storage::{SnapshotStore, SqliteStore, StorageResult};
use chrono::{DateTime, Utc};

/// Tally of one batch or standalone pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Documents scanned
    pub documents: u64,

    /// Documents that could not be rendered
    pub documents_failed: u64,

    /// Raw extractor hits
    pub candidates: u64,

    /// URLs that survived filtering and deduplication
    pub admitted: u64,

    pub already_snapshotted: u64,
    pub snapshotted: u64,
    pub archived: u64,
    pub not_text: u64,
    pub server_errors: u64,
    pub transport_errors: u64,
    pub client_errors: u64,
    pub archive_misses: u64,
    pub store_failures: u64,
}

impl PassStats {
    pub fn record(&mut self, disposition: UrlDisposition) {
        self.admitted += 1;
        let counter = match disposition {
            UrlDisposition::AlreadySnapshotted => &mut self.already_snapshotted,
            UrlDisposition::Snapshotted => &mut self.snapshotted,
            UrlDisposition::Archived => &mut self.archived,
            UrlDisposition::NotText => &mut self.not_text,
            UrlDisposition::ServerError => &mut self.server_errors,
            UrlDisposition::TransportError => &mut self.transport_errors,
            UrlDisposition::ClientError => &mut self.client_errors,
            UrlDisposition::ArchiveMiss => &mut self.archive_misses,
            UrlDisposition::StoreFailed => &mut self.store_failures,
        };
        *counter += 1;
    }

    pub fn add_document(&mut self, report: &DocumentReport) {
        self.documents += 1;
        self.candidates += report.candidates as u64;
        for (_, disposition) in &report.urls {
            self.record(*disposition);
        }
    }

    pub fn merge(&mut self, other: &PassStats) {
        self.documents += other.documents;
        self.documents_failed += other.documents_failed;
        self.candidates += other.candidates;
        self.admitted += other.admitted;
        self.already_snapshotted += other.already_snapshotted;
        self.snapshotted += other.snapshotted;
        self.archived += other.archived;
        self.not_text += other.not_text;
        self.server_errors += other.server_errors;
        self.transport_errors += other.transport_errors;
        self.client_errors += other.client_errors;
        self.archive_misses += other.archive_misses;
        self.store_failures += other.store_failures;
    }

    /// Records written by this pass
    pub fn stored(&self) -> u64 {
        self.snapshotted + self.archived
    }

    /// URLs that a later pass will try again
    pub fn pending(&self) -> u64 {
        self.admitted - self.already_snapshotted - self.stored()
    }

    pub fn log_summary(&self, label: &str) {
        tracing::info!(
            "{} pass done: {} documents ({} failed), {} urls admitted, {} stored ({} from archive), {} already known, {} pending",
            label,
            self.documents,
            self.documents_failed,
            self.admitted,
            self.stored(),
            self.archived,
            self.already_snapshotted,
            self.pending()
        );

        if self.pending() > 0 {
            tracing::debug!(
                "{} pass failures: not-text={} server={} transport={} client={} archive-miss={} store={}",
                label,
                self.not_text,
                self.server_errors,
                self.transport_errors,
                self.client_errors,
                self.archive_misses,
                self.store_failures
            );
        }
    }
}

/// Snapshot database summary
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    pub table: String,
    pub total_snapshots: u64,
    pub by_status: Vec<(String, u64)>,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

pub fn load_statistics(store: &SqliteStore) -> StorageResult<StoreStatistics> {
    let total_snapshots = store.count()?;
    let by_status = store.count_by_status()?;
    let range = store.capture_range()?;

    Ok(StoreStatistics {
        table: store.table().to_string(),
        total_snapshots,
        by_status,
        oldest: range.map(|(oldest, _)| oldest),
        newest: range.map(|(_, newest)| newest),
    })
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Snapshot Statistics ===\n");

    println!("Table: {}", stats.table);
    println!("Total snapshots: {}", stats.total_snapshots);
    if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
        println!("Oldest capture: {}", oldest.to_rfc3339());
        println!("Newest capture: {}", newest.to_rfc3339());
    }
    println!();

    if !stats.by_status.is_empty() {
        println!("By status line:");
        for (status, count) in &stats.by_status {
            let percentage = (*count as f64 / stats.total_snapshots.max(1) as f64) * 100.0;
            let status = if status.is_empty() { "(none)" } else { status };
            println!("  {}: {} ({:.1}%)", status, count, percentage);
        }
    }
}
