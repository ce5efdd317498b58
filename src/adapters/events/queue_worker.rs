//! QueueWorker - drains the outbox and drives handler delivery.
//!
//! The loop:
//! 1. Claim a batch of due outbox rows (atomic, multi-worker safe).
//! 2. Forward each envelope to the configured transport, when one exists
//!    (cross-instance fan-out; single-node dev runs without).
//! 3. Dispatch through the `EventRouter` to the async handler set.
//! 4. Mark the row Processed on success; on failure schedule a retry with
//!    exponential backoff + jitter, or dead-letter it once the budget is
//!    spent or the failure is fatal (unknown type, undecodable payload).
//!
//! Maintenance runs on a slower cadence: stuck-claim release and TTL
//! cleanup of processed rows.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio::time;
use tracing::{error, info, warn};

use crate::application::Metrics;
use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{OutboxMessage, OutboxStore, QueueTransport};

use super::registry::{is_fatal, EventRouter};

/// Configuration for the queue worker.
#[derive(Debug, Clone)]
pub struct QueueWorkerConfig {
    /// Name recorded in `claimed_by`; unique per worker instance.
    pub worker_id: String,
    /// How often to poll for due rows.
    pub poll_interval: Duration,
    /// Max rows claimed per poll cycle.
    pub batch_size: u32,
    /// Retry budget per row before dead-lettering.
    pub max_tries: i32,
    /// First retry delay; doubles per attempt.
    pub base_backoff: Duration,
    /// Backoff ceiling.
    pub max_backoff: Duration,
    /// Claims older than this are presumed orphaned and released.
    pub claim_timeout: Duration,
    /// Processed rows older than this are deleted.
    pub retention: Duration,
    /// Poll cycles between maintenance passes.
    pub maintenance_every: u32,
}

impl Default for QueueWorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: format!("worker-{}", uuid::Uuid::new_v4()),
            poll_interval: Duration::from_millis(200),
            batch_size: 50,
            max_tries: 5,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
            claim_timeout: Duration::from_secs(120),
            retention: Duration::from_secs(24 * 3600),
            maintenance_every: 50,
        }
    }
}

/// Long-running worker delivering outbox rows to handlers.
pub struct QueueWorker {
    outbox: Arc<dyn OutboxStore>,
    transport: Option<Arc<dyn QueueTransport>>,
    router: Arc<EventRouter>,
    metrics: Arc<Metrics>,
    config: QueueWorkerConfig,
}

impl QueueWorker {
    pub fn new(
        outbox: Arc<dyn OutboxStore>,
        transport: Option<Arc<dyn QueueTransport>>,
        router: Arc<EventRouter>,
        metrics: Arc<Metrics>,
        config: QueueWorkerConfig,
    ) -> Self {
        Self {
            outbox,
            transport,
            router,
            metrics,
            config,
        }
    }

    /// Run until the shutdown signal flips; finishes the in-flight batch.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), DomainError> {
        info!(
            worker_id = %self.config.worker_id,
            batch_size = self.config.batch_size,
            max_tries = self.config.max_tries,
            "queue worker starting"
        );

        let mut interval = time::interval(self.config.poll_interval);
        let mut ticks: u32 = 0;

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        self.process_batch().await?;
                        info!(worker_id = %self.config.worker_id, "queue worker stopped");
                        return Ok(());
                    }
                }

                _ = interval.tick() => {
                    if let Err(e) = self.process_batch().await {
                        // Claiming failed (store unavailable); keep polling.
                        error!(worker_id = %self.config.worker_id, error = %e, "outbox batch failed");
                    }

                    ticks = ticks.wrapping_add(1);
                    if ticks % self.config.maintenance_every.max(1) == 0 {
                        self.run_maintenance().await;
                    }
                }
            }
        }
    }

    /// Claim and deliver one batch; returns rows handled.
    pub async fn process_batch(&self) -> Result<usize, DomainError> {
        let batch = self
            .outbox
            .claim_batch(
                self.config.batch_size,
                &self.config.worker_id,
                self.config.max_tries,
            )
            .await?;

        let mut handled = 0;
        for row in batch {
            self.deliver(row).await?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Run exactly one poll cycle (test hook).
    pub async fn poll_once(&self) -> Result<usize, DomainError> {
        self.process_batch().await
    }

    async fn deliver(&self, row: OutboxMessage) -> Result<(), DomainError> {
        let attempt = row.try_count + 1;

        if let Some(transport) = &self.transport {
            if let Err(e) = transport.send(&row.envelope).await {
                warn!(
                    event_id = %row.envelope.event_id,
                    event_type = %row.event_type,
                    attempt,
                    error = %e,
                    "transport publish failed"
                );
                return self.record_failure(row, attempt, &e).await;
            }
        }

        match self.router.dispatch(&row.envelope).await {
            Ok(()) => {
                self.outbox.mark_processed(row.id).await?;
                self.metrics.incr_outbox_processed();
                Ok(())
            }
            Err(e) => {
                warn!(
                    event_id = %row.envelope.event_id,
                    event_type = %row.event_type,
                    attempt,
                    fatal = is_fatal(&e),
                    error = %e,
                    "handler dispatch failed"
                );
                self.record_failure(row, attempt, &e).await
            }
        }
    }

    async fn record_failure(
        &self,
        row: OutboxMessage,
        attempt: i32,
        error: &DomainError,
    ) -> Result<(), DomainError> {
        self.metrics.incr_outbox_failed_attempt();

        let exhausted = attempt >= self.config.max_tries;
        if exhausted || is_fatal(error) {
            // Dead-letter: best-effort copy onto the DLQ, then park the row.
            // `mark_failed` lifts try_count to the attempt count, which takes
            // the row out of the claim window for good once exhausted; fatal
            // rows are parked with a sentinel far-future attempt time.
            if let Some(transport) = &self.transport {
                if let Err(dlq_err) = transport.send_dead_letter(&row.envelope).await {
                    error!(
                        event_id = %row.envelope.event_id,
                        error = %dlq_err,
                        "dead-letter publish failed"
                    );
                }
            }
            let parked_until = Timestamp::now().plus_hours(24 * 365);
            self.outbox
                .mark_failed(row.id, &error.to_string(), parked_until)
                .await?;
            self.metrics.incr_outbox_dead_lettered();
            return Ok(());
        }

        let next_attempt_at = Timestamp::now().plus_secs(self.backoff_secs(attempt));
        self.outbox
            .mark_failed(row.id, &error.to_string(), next_attempt_at)
            .await?;
        Ok(())
    }

    /// Exponential backoff with jitter, capped.
    fn backoff_secs(&self, attempt: i32) -> u64 {
        let shift = attempt.clamp(1, 16) as u32 - 1;
        let base = self.config.base_backoff.as_secs().max(1);
        let raw = base.saturating_mul(1u64 << shift);
        let capped = raw.min(self.config.max_backoff.as_secs().max(1));
        let jitter = rand::thread_rng().gen_range(0..=capped / 2);
        capped + jitter
    }

    async fn run_maintenance(&self) {
        let claimed_before =
            Timestamp::now().minus_secs(self.config.claim_timeout.as_secs());
        match self.outbox.release_stuck(claimed_before).await {
            Ok(0) => {}
            Ok(released) => warn!(released, "released stuck outbox claims"),
            Err(e) => error!(error = %e, "stuck-claim sweep failed"),
        }

        let older_than = Timestamp::now().minus_secs(self.config.retention.as_secs());
        match self.outbox.delete_processed_before(older_than).await {
            Ok(0) => {}
            Ok(deleted) => info!(deleted, "cleaned up processed outbox rows"),
            Err(e) => error!(error = %e, "outbox retention cleanup failed"),
        }
    }
}
