//! Pass scheduling
//!
//! Two triggers drive the snapshotter:
//! - a periodic full batch, the first one immediately on start
//! - a deferred single-document pass shortly after a document is published
//!
//! The two may overlap in time. The store's insert-if-absent contract keeps
//! that harmless; no cross-pass locking is done here.

use crate::config::ScheduleConfig;
use crate::crawler::coordinator::Snapshotter;
use crate::output::PassStats;
use crate::storage::SnapshotStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Publication state of a document in the host system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublishState {
    New,
    Draft,
    AutoDraft,
    Pending,
    Private,
    Future,
    Publish,
    Other,
}

impl PublishState {
    /// Parses the host's state name; unknown names map to `Other`
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "new" => Self::New,
            "draft" => Self::Draft,
            "auto-draft" => Self::AutoDraft,
            "pending" => Self::Pending,
            "private" => Self::Private,
            "future" => Self::Future,
            "publish" => Self::Publish,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Draft => "draft",
            Self::AutoDraft => "auto-draft",
            Self::Pending => "pending",
            Self::Private => "private",
            Self::Future => "future",
            Self::Publish => "publish",
            Self::Other => "other",
        }
    }
}

/// True when moving from `old` to `new` is a fresh publication
///
/// Re-publishing an already published document and transitions out of an
/// unknown state do not count.
pub fn triggers_snapshot(old: PublishState, new: PublishState) -> bool {
    new == PublishState::Publish
        && matches!(
            old,
            PublishState::New
                | PublishState::Draft
                | PublishState::AutoDraft
                | PublishState::Pending
                | PublishState::Private
                | PublishState::Future
        )
}

/// Runs batch passes on an interval and deferred single-document passes
pub struct Scheduler<S> {
    snapshotter: Arc<Snapshotter<S>>,
    batch_interval: Duration,
    publish_delay: Duration,
}

impl<S> Clone for Scheduler<S> {
    fn clone(&self) -> Self {
        Self {
            snapshotter: Arc::clone(&self.snapshotter),
            batch_interval: self.batch_interval,
            publish_delay: self.publish_delay,
        }
    }
}

impl<S: SnapshotStore + 'static> Scheduler<S> {
    pub fn new(snapshotter: Arc<Snapshotter<S>>, config: &ScheduleConfig) -> Self {
        Self::with_timing(
            snapshotter,
            Duration::from_secs(config.batch_interval_secs),
            Duration::from_secs(config.publish_delay_secs),
        )
    }

    pub fn with_timing(
        snapshotter: Arc<Snapshotter<S>>,
        batch_interval: Duration,
        publish_delay: Duration,
    ) -> Self {
        Self {
            snapshotter,
            batch_interval,
            publish_delay,
        }
    }

    /// Runs batch passes until `shutdown` resolves
    ///
    /// A pass in progress when shutdown fires is abandoned at its next
    /// suspension point. Returns the totals over all completed passes.
    pub async fn run_until<F>(&self, shutdown: F) -> PassStats
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.batch_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut totals = PassStats::default();
        let mut passes = 0u64;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Scheduler stopping after {} batch passes", passes);
                    break;
                }
                _ = interval.tick() => {
                    tokio::select! {
                        _ = &mut shutdown => {
                            tracing::info!("Shutdown during batch pass {}; abandoning it", passes + 1);
                            break;
                        }
                        result = self.snapshotter.run_batch() => {
                            passes += 1;
                            match result {
                                Ok(stats) => totals.merge(&stats),
                                Err(e) => tracing::error!("Batch pass {} failed: {}", passes, e),
                            }
                        }
                    }
                }
            }
        }

        totals
    }

    /// Spawns a standalone pass over `document_id` after the publish delay
    pub fn schedule_single(&self, document_id: impl Into<String>) -> JoinHandle<Option<PassStats>> {
        let document_id = document_id.into();
        let snapshotter = Arc::clone(&self.snapshotter);
        let delay = self.publish_delay;

        tracing::debug!("Scheduling standalone pass for {} in {:?}", document_id, delay);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match snapshotter.run_single_id(&document_id).await {
                Ok(stats) => Some(stats),
                Err(e) => {
                    tracing::warn!("Standalone pass for {} failed: {}", document_id, e);
                    None
                }
            }
        })
    }

    /// Publish-transition hook: schedules a standalone pass when warranted
    pub fn on_transition(
        &self,
        document_id: &str,
        old: PublishState,
        new: PublishState,
    ) -> Option<JoinHandle<Option<PassStats>>> {
        if !triggers_snapshot(old, new) {
            tracing::trace!(
                "Ignoring {} -> {} for {}",
                old.as_str(),
                new.as_str(),
                document_id
            );
            return None;
        }
        Some(self.schedule_single(document_id))
    }
}
