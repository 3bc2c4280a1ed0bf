//! Periodic resubmission of stored events.

use crate::{CachingTransport, DeliveryOutcome, OutboundEvent};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use telemetry_event_store::{PendingEvent, DEFAULT_BATCH_LIMIT};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Replay scheduling configuration.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Maximum stored events resubmitted per flush.
    pub batch_size: usize,
    /// Maximum replays in flight at once within a flush.
    pub max_concurrency: usize,
    /// Time between flushes when running on a timer.
    pub interval: Duration,
    /// Flush as soon as the timer loop starts instead of after one interval.
    pub flush_on_start: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_LIMIT,
            max_concurrency: 4,
            interval: Duration::from_secs(60),
            flush_on_start: true,
        }
    }
}

/// What one flush did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Stored events read.
    pub fetched: usize,
    /// Replays the collector accepted (now removed from the store).
    pub delivered: usize,
    /// Replays that failed again (still stored).
    pub failed: usize,
    /// Unreadable events removed instead of replayed.
    pub dropped: usize,
}

enum ReplayStep {
    Delivered,
    Failed,
    Dropped,
}

/// Gives previously failed events another chance.
///
/// Holds no state between flushes; everything lives in the event store.
pub struct ReplayScheduler {
    transport: Arc<CachingTransport>,
    config: ReplayConfig,
}

impl ReplayScheduler {
    /// Create a scheduler replaying through `transport`.
    pub fn new(transport: Arc<CachingTransport>, config: ReplayConfig) -> Self {
        Self { transport, config }
    }

    /// Resubmit one batch of stored events as replays.
    ///
    /// Each event is handled independently. Nothing is retried within the
    /// call; events that fail again wait for the next flush. Storage errors
    /// are logged and produce an empty report.
    pub async fn flush_pending(&self) -> FlushReport {
        let batch = match self
            .transport
            .store()
            .query_batch(self.config.batch_size)
            .await
        {
            Ok(batch) => batch,
            Err(e) => {
                error!(error = %e, "Could not read pending events");
                return FlushReport::default();
            }
        };

        if batch.is_empty() {
            debug!("No pending events to replay");
            return FlushReport::default();
        }

        let mut report = FlushReport {
            fetched: batch.len(),
            ..Default::default()
        };

        let transport = Arc::clone(&self.transport);
        let results: Vec<ReplayStep> = stream::iter(batch)
            .map(move |pending| replay_one(Arc::clone(&transport), pending))
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        for result in results {
            match result {
                ReplayStep::Delivered => report.delivered += 1,
                ReplayStep::Failed => report.failed += 1,
                ReplayStep::Dropped => report.dropped += 1,
            }
        }

        info!(
            fetched = report.fetched,
            delivered = report.delivered,
            failed = report.failed,
            dropped = report.dropped,
            "Replay flush complete"
        );
        report
    }

    /// Run `flush_pending` on a timer until the returned handle is shut down.
    pub fn spawn(self: Arc<Self>) -> ReplayHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            let mut ticker = interval(self.config.interval.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            // The first tick completes immediately.
            if !self.config.flush_on_start {
                ticker.tick().await;
            }

            info!(interval = ?self.config.interval, "Replay loop started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.flush_pending().await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Replay loop stopped");
        });

        ReplayHandle { shutdown_tx, join }
    }
}

async fn replay_one(transport: Arc<CachingTransport>, pending: PendingEvent) -> ReplayStep {
    let event = match OutboundEvent::from_pending(&pending) {
        Ok(event) => event,
        Err(e) => {
            error!(event_id = %pending.event_id, error = %e, "Dropping unreadable stored event");
            if let Err(e) = transport.store().delete(&pending.event_id).await {
                warn!(event_id = %pending.event_id, error = %e, "Failed to drop unreadable event");
            }
            return ReplayStep::Dropped;
        }
    };

    match transport.send_event(&event).await.outcome {
        DeliveryOutcome::Delivered => ReplayStep::Delivered,
        DeliveryOutcome::Failed => ReplayStep::Failed,
    }
}

/// Handle to a running replay loop.
pub struct ReplayHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl ReplayHandle {
    /// Stop the loop and wait for it to finish. An in-progress flush completes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.join.await {
            warn!(error = %e, "Replay loop ended abnormally");
        }
    }

    /// Whether the loop task has exited.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
