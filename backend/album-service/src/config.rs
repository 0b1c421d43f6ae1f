/// Configuration management for the album service and review worker.
///
/// Loads configuration from environment variables with sensible defaults.
use crate::error::{AppError, Result};

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub queue: QueueConfig,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone, Debug)]
pub struct QueueConfig {
    pub redis_url: String,
    /// Durable stream reviews are published to.
    pub stream: String,
    /// Consumer group shared by all worker instances.
    pub group: String,
    /// Stream poison and retry-exhausted entries are moved to.
    pub dead_letter_stream: String,
    /// Per-instance consumer name within the group.
    pub consumer_name: String,
    /// Delivery attempts before a pending entry is dead-lettered.
    pub max_delivery_attempts: u64,
    /// Minimum idle time before a pending entry is reclaimed for retry.
    pub claim_idle_ms: u64,
    /// How long one blocking read waits for new entries.
    pub block_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            app: AppConfig {
                host: env_or("ALBUM_SERVICE_HOST", "0.0.0.0"),
                port: env_parse("ALBUM_SERVICE_PORT", 8080)?,
            },
            database: DatabaseConfig {
                url: env_or("DATABASE_URL", "postgresql://localhost/albums"),
                max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            queue: QueueConfig {
                redis_url: env_or("REDIS_URL", "redis://localhost"),
                stream: env_or("REVIEW_STREAM", review_schema::REVIEW_STREAM),
                group: env_or("REVIEW_GROUP", review_schema::REVIEW_GROUP),
                dead_letter_stream: env_or(
                    "REVIEW_DEAD_LETTER_STREAM",
                    review_schema::REVIEW_DEAD_STREAM,
                ),
                consumer_name: env_or(
                    "REVIEW_CONSUMER_NAME",
                    &format!("review-worker-{}", std::process::id()),
                ),
                max_delivery_attempts: env_parse("REVIEW_MAX_DELIVERY_ATTEMPTS", 5)?,
                claim_idle_ms: env_parse("REVIEW_CLAIM_IDLE_MS", 30_000)?,
                block_ms: env_parse("REVIEW_BLOCK_MS", 5_000)?,
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an env var when present; an unset var takes the default, a present
/// but unparsable one is a configuration error rather than a silent fallback.
fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("{key} has invalid value {raw:?}"))),
        Err(_) => Ok(default),
    }
}
