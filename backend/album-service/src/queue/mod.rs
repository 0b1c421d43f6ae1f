//! Redis Streams client for the review queue.
//!
//! The stream is the durable broker: the producer XADDs entries, workers read
//! them through a consumer group and ack per entry. An entry that was
//! delivered but not acked stays in the group's pending list until a reclaim
//! sweep redelivers it; discarded entries are copied to the dead-letter
//! stream before the ack so nothing is silently lost.

use crate::config::QueueConfig;
use crate::error::Result;
use redis::streams::{
    StreamClaimReply, StreamId, StreamPendingCountReply, StreamReadOptions, StreamReadReply,
};
use redis::{AsyncCommands, Client};
use review_schema::{ReviewMessage, CONTENT_TYPE_JSON, SCHEMA_VERSION};
use tracing::debug;

/// One entry delivered from the stream, with the ID needed to settle it.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub entry_id: String,
    pub payload: Vec<u8>,
    pub content_type: Option<String>,
}

/// A delivered-but-unacked entry as reported by XPENDING.
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub entry_id: String,
    pub idle_ms: u64,
    pub delivery_count: u64,
}

#[derive(Clone)]
pub struct ReviewQueue {
    client: Client,
    stream: String,
    group: String,
    dead_stream: String,
}

impl ReviewQueue {
    pub fn connect(config: &QueueConfig) -> Result<Self> {
        let client = Client::open(config.redis_url.as_str())?;
        Ok(Self {
            client,
            stream: config.stream.clone(),
            group: config.group.clone(),
            dead_stream: config.dead_letter_stream.clone(),
        })
    }

    async fn conn(&self) -> Result<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Publish one review.
    ///
    /// Fire-and-forget from the broker's perspective: this returns once the
    /// broker has stored the entry and never waits on a consumer.
    pub async fn publish(&self, message: &ReviewMessage) -> Result<String> {
        let payload = message.encode()?;
        let mut conn = self.conn().await?;

        let entry_id: String = conn
            .xadd(
                &self.stream,
                "*",
                &[
                    ("content_type", CONTENT_TYPE_JSON.as_bytes().to_vec()),
                    ("schema_version", SCHEMA_VERSION.to_string().into_bytes()),
                    ("payload", payload),
                ],
            )
            .await?;

        debug!(%entry_id, album_id = %message.album_id, "review published");
        Ok(entry_id)
    }

    /// Idempotently declare the stream and consumer group. BUSYGROUP from an
    /// earlier declare is not an error: producer and workers both call this
    /// so either side can start first.
    pub async fn ensure_group(&self) -> Result<()> {
        let mut conn = self.conn().await?;
        let created: redis::RedisResult<()> = conn
            .xgroup_create_mkstream(&self.stream, &self.group, "0")
            .await;
        match created {
            Ok(()) => Ok(()),
            Err(err) if err.code() == Some("BUSYGROUP") => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Block up to `block_ms` waiting for entries not yet delivered to the
    /// group. An empty batch means the block window elapsed idle.
    pub async fn read_new(
        &self,
        consumer: &str,
        count: usize,
        block_ms: u64,
    ) -> Result<Vec<Delivery>> {
        let mut conn = self.conn().await?;
        let opts = StreamReadOptions::default()
            .group(&self.group, consumer)
            .count(count)
            .block(block_ms as usize);

        let reply: StreamReadReply = conn
            .xread_options(&[&self.stream], &[">"], &opts)
            .await?;

        Ok(reply
            .keys
            .into_iter()
            .flat_map(|key| key.ids)
            .map(delivery_from)
            .collect())
    }

    /// Positively acknowledge an entry, removing it from the pending list.
    pub async fn ack(&self, entry_id: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: i64 = conn.xack(&self.stream, &self.group, &[entry_id]).await?;
        Ok(())
    }

    /// Negative acknowledgment without requeue: copy the entry to the
    /// dead-letter stream, then ack the original so it is never redelivered.
    pub async fn dead_letter(&self, delivery: &Delivery, reason: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: String = conn
            .xadd(
                &self.dead_stream,
                "*",
                &[
                    ("origin_id", delivery.entry_id.clone().into_bytes()),
                    ("reason", reason.as_bytes().to_vec()),
                    ("payload", delivery.payload.clone()),
                ],
            )
            .await?;
        let _: i64 = conn
            .xack(&self.stream, &self.group, &[&delivery.entry_id])
            .await?;
        Ok(())
    }

    /// Entries delivered to the group but never acked, oldest first, with
    /// broker-side idle time and delivery count.
    pub async fn pending(&self, count: usize) -> Result<Vec<PendingEntry>> {
        let mut conn = self.conn().await?;
        let reply: StreamPendingCountReply = conn
            .xpending_count(&self.stream, &self.group, "-", "+", count)
            .await?;

        Ok(reply
            .ids
            .into_iter()
            .map(|p| PendingEntry {
                entry_id: p.id,
                idle_ms: p.last_delivered_ms as u64,
                delivery_count: p.times_delivered as u64,
            })
            .collect())
    }

    /// Claim pending entries for this consumer so they can be retried here.
    /// Claiming bumps the broker-side delivery counter.
    pub async fn claim(
        &self,
        consumer: &str,
        min_idle_ms: u64,
        entry_ids: &[String],
    ) -> Result<Vec<Delivery>> {
        if entry_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn().await?;
        let reply: StreamClaimReply = conn
            .xclaim(&self.stream, &self.group, consumer, min_idle_ms, entry_ids)
            .await?;

        Ok(reply.ids.into_iter().map(delivery_from).collect())
    }
}

fn delivery_from(entry: StreamId) -> Delivery {
    let payload: Vec<u8> = entry.get("payload").unwrap_or_default();
    let content_type: Option<String> = entry.get("content_type");
    Delivery {
        entry_id: entry.id,
        payload,
        content_type,
    }
}
