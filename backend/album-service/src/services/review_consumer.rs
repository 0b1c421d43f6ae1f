//! Consumer side of the review pipeline.
//!
//! Per-entry state machine:
//! received → decoding → {decode failed, persisting} → {persist failed,
//! persisted} → acked | requeued | dead-lettered.
//!
//! A malformed payload is poison: it will never decode on a later attempt,
//! so it goes straight to the dead-letter stream. A persist failure is
//! presumed transient: the entry stays pending and the reclaim sweep retries
//! it, dead-lettering once the delivery count passes the configured cap.

use crate::db::review_repo;
use crate::error::Result;
use crate::queue::{Delivery, PendingEntry, ReviewQueue};
use async_trait::async_trait;
use review_schema::ReviewMessage;
use sqlx::PgPool;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

pub const REASON_MALFORMED: &str = "malformed payload";
pub const REASON_RETRIES_EXHAUSTED: &str = "delivery attempts exhausted";

/// Store seam for consumed reviews.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert_review(&self, review: &ReviewMessage) -> Result<()>;
}

#[async_trait]
impl ReviewStore for PgPool {
    async fn insert_review(&self, review: &ReviewMessage) -> Result<()> {
        review_repo::insert_review(self, review).await
    }
}

/// Broker seam: the queue operations the consumer loop drives.
#[async_trait]
pub trait BrokerQueue: Send + Sync {
    async fn ensure_group(&self) -> Result<()>;
    async fn read_new(&self, consumer: &str, count: usize, block_ms: u64)
        -> Result<Vec<Delivery>>;
    async fn ack(&self, entry_id: &str) -> Result<()>;
    async fn dead_letter(&self, delivery: &Delivery, reason: &str) -> Result<()>;
    async fn pending(&self, count: usize) -> Result<Vec<PendingEntry>>;
    async fn claim(
        &self,
        consumer: &str,
        min_idle_ms: u64,
        entry_ids: &[String],
    ) -> Result<Vec<Delivery>>;
}

#[async_trait]
impl BrokerQueue for ReviewQueue {
    async fn ensure_group(&self) -> Result<()> {
        ReviewQueue::ensure_group(self).await
    }

    async fn read_new(
        &self,
        consumer: &str,
        count: usize,
        block_ms: u64,
    ) -> Result<Vec<Delivery>> {
        ReviewQueue::read_new(self, consumer, count, block_ms).await
    }

    async fn ack(&self, entry_id: &str) -> Result<()> {
        ReviewQueue::ack(self, entry_id).await
    }

    async fn dead_letter(&self, delivery: &Delivery, reason: &str) -> Result<()> {
        ReviewQueue::dead_letter(self, delivery, reason).await
    }

    async fn pending(&self, count: usize) -> Result<Vec<PendingEntry>> {
        ReviewQueue::pending(self, count).await
    }

    async fn claim(
        &self,
        consumer: &str,
        min_idle_ms: u64,
        entry_ids: &[String],
    ) -> Result<Vec<Delivery>> {
        ReviewQueue::claim(self, consumer, min_idle_ms, entry_ids).await
    }
}

/// How to settle an entry with the broker after one processing attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Persisted; remove the entry from the queue.
    Ack,
    /// Transient store failure; leave the entry pending for redelivery.
    Requeue,
    /// Poison or exhausted entry; dead-letter it, never retry.
    Discard(&'static str),
}

/// One pass of the state machine over a raw payload.
pub async fn process_delivery(store: &dyn ReviewStore, payload: &[u8]) -> Disposition {
    let review = match ReviewMessage::decode(payload) {
        Ok(review) => review,
        Err(err) => {
            warn!(%err, "dropping undecodable review entry");
            return Disposition::Discard(REASON_MALFORMED);
        }
    };

    match store.insert_review(&review).await {
        Ok(()) => {
            info!(
                album_id = %review.album_id,
                action = review.action.as_str(),
                "review persisted"
            );
            Disposition::Ack
        }
        Err(err) => {
            warn!(
                %err,
                album_id = %review.album_id,
                "review insert failed, leaving entry for redelivery"
            );
            Disposition::Requeue
        }
    }
}

/// Ceiling on the per-attempt redelivery delay.
const MAX_BACKOFF_MS: u64 = 10 * 60 * 1000;

/// Retry policy for pending entries: exponential backoff between redelivery
/// attempts, dead-letter once the delivery count reaches
/// `max_delivery_attempts`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_delivery_attempts: u64,
    pub claim_idle_ms: u64,
}

impl RetryPolicy {
    /// Idle time an entry must accumulate before its next redelivery:
    /// `claim_idle_ms`, doubled per prior delivery, capped at
    /// `MAX_BACKOFF_MS`.
    pub fn backoff_ms(&self, delivery_count: u64) -> u64 {
        let exponent = delivery_count.saturating_sub(1).min(6) as u32;
        self.claim_idle_ms
            .saturating_mul(1 << exponent)
            .min(MAX_BACKOFF_MS)
    }

    pub fn is_stale(&self, entry: &PendingEntry) -> bool {
        entry.idle_ms >= self.backoff_ms(entry.delivery_count)
    }

    pub fn is_exhausted(&self, delivery_count: u64) -> bool {
        delivery_count >= self.max_delivery_attempts
    }
}

/// Long-running worker: one sequential message loop per instance. Instances
/// scale out by sharing the consumer group; the broker arbitrates dispatch.
pub struct ReviewConsumer<Q: BrokerQueue, S: ReviewStore> {
    queue: Q,
    store: S,
    consumer_name: String,
    policy: RetryPolicy,
    block_ms: u64,
    shutdown_rx: watch::Receiver<bool>,
}

impl<Q: BrokerQueue, S: ReviewStore> ReviewConsumer<Q, S> {
    pub fn new(
        queue: Q,
        store: S,
        consumer_name: String,
        policy: RetryPolicy,
        block_ms: u64,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            queue,
            store,
            consumer_name,
            policy,
            block_ms,
            shutdown_rx,
        }
    }

    /// Run the consumer loop until shutdown is signalled.
    pub async fn run(&mut self) -> Result<()> {
        // Idempotent declare before subscribing, so the queue exists with the
        // same persistence semantics the producer relies on.
        self.queue.ensure_group().await?;
        info!(consumer = %self.consumer_name, "review consumer started");

        // The sweep runs on its own timer so sustained traffic cannot starve
        // pending-entry retries: a loop that always has fresh entries to read
        // must still revisit the pending list.
        let mut sweep = tokio::time::interval(Duration::from_millis(self.block_ms.max(1)));

        loop {
            tokio::select! {
                changed = self.shutdown_rx.changed() => {
                    // A closed channel means the sender is gone and no signal
                    // can ever arrive; stop rather than spin on the error.
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("shutdown signal received, stopping consumer");
                        break;
                    }
                }

                _ = sweep.tick() => {
                    if let Err(err) = self.reclaim_stale().await {
                        error!(%err, "reclaim sweep failed");
                    }
                }

                batch = self.queue.read_new(&self.consumer_name, 8, self.block_ms) => {
                    match batch {
                        Ok(batch) => {
                            for delivery in batch {
                                self.settle(delivery).await;
                            }
                        }
                        Err(err) => {
                            error!(%err, "queue read failed, backing off");
                            tokio::time::sleep(Duration::from_secs(2)).await;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Run the state machine on one delivery and settle it with the broker.
    async fn settle(&self, delivery: Delivery) {
        match process_delivery(&self.store, &delivery.payload).await {
            Disposition::Ack => {
                if let Err(err) = self.queue.ack(&delivery.entry_id).await {
                    // The row landed but the ack did not: the entry will be
                    // redelivered and insert a duplicate, which the
                    // append-only model tolerates.
                    error!(%err, entry_id = %delivery.entry_id, "ack failed");
                }
            }
            Disposition::Requeue => {
                // No broker call: the unacked entry stays in the pending
                // list until the reclaim sweep picks it up.
            }
            Disposition::Discard(reason) => {
                if let Err(err) = self.queue.dead_letter(&delivery, reason).await {
                    error!(%err, entry_id = %delivery.entry_id, "dead-letter move failed");
                }
            }
        }
    }

    /// Redeliver stale pending entries, dead-lettering any past the cap.
    async fn reclaim_stale(&self) -> Result<()> {
        let pending = self.queue.pending(64).await?;

        let mut retry_ids = Vec::new();
        let mut exhausted_ids = Vec::new();
        for entry in pending.iter().filter(|e| self.policy.is_stale(e)) {
            if self.policy.is_exhausted(entry.delivery_count) {
                exhausted_ids.push(entry.entry_id.clone());
            } else {
                retry_ids.push(entry.entry_id.clone());
            }
        }

        let exhausted = self
            .queue
            .claim(&self.consumer_name, self.policy.claim_idle_ms, &exhausted_ids)
            .await?;
        for delivery in exhausted {
            warn!(entry_id = %delivery.entry_id, "delivery attempts exhausted, dead-lettering");
            self.queue
                .dead_letter(&delivery, REASON_RETRIES_EXHAUSTED)
                .await?;
        }

        let retries = self
            .queue
            .claim(&self.consumer_name, self.policy.claim_idle_ms, &retry_ids)
            .await?;
        for delivery in retries {
            self.settle(delivery).await;
        }

        Ok(())
    }
}
