//! Review Worker - queue consumer
//!
//! Independent long-running process that drains the review queue: decodes
//! each entry, appends it to the reviews table, and settles the entry with
//! the broker. Scale out by running more instances against the same consumer
//! group; no coordination between instances is needed.
//!
//! Environment variables:
//! - DATABASE_URL: PostgreSQL URL for the albums/reviews tables
//! - REDIS_URL: broker address
//! - REVIEW_STREAM / REVIEW_GROUP / REVIEW_DEAD_LETTER_STREAM: queue naming
//! - REVIEW_CONSUMER_NAME: per-instance consumer name (default: pid-based)
//! - REVIEW_MAX_DELIVERY_ATTEMPTS: retry cap before dead-lettering (default: 5)
//! - REVIEW_CLAIM_IDLE_MS: idle time before a pending entry is reclaimed (default: 30000)
//! - REVIEW_BLOCK_MS: blocking read window (default: 5000)

use album_service::queue::ReviewQueue;
use album_service::services::review_consumer::{RetryPolicy, ReviewConsumer};
use album_service::Config;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    album_service::db::ensure_tables(&pool).await?;

    let queue = ReviewQueue::connect(&config.queue)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(%err, "failed to listen for shutdown signal");
            return;
        }
        info!("shutdown requested");
        let _ = shutdown_tx.send(true);
    });

    let policy = RetryPolicy {
        max_delivery_attempts: config.queue.max_delivery_attempts,
        claim_idle_ms: config.queue.claim_idle_ms,
    };

    let mut consumer = ReviewConsumer::new(
        queue,
        pool,
        config.queue.consumer_name.clone(),
        policy,
        config.queue.block_ms,
        shutdown_rx,
    );
    consumer.run().await?;

    info!("review worker stopped");
    Ok(())
}
