pub mod album_repo;
pub mod review_repo;

use crate::error::Result;
use sqlx::PgPool;
use tracing::info;

/// Ensure the service tables exist.
///
/// Bootstrap is idempotent and runs at the start of both binaries, so fresh
/// environments come up without a separate migration step and the producer
/// and worker agree on the schema before first use.
pub async fn ensure_tables(pool: &PgPool) -> Result<()> {
    info!("ensuring albums and reviews tables exist");

    sqlx::query(ALBUMS_TABLE).execute(pool).await?;
    sqlx::query(REVIEWS_TABLE).execute(pool).await?;

    Ok(())
}

const ALBUMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS albums (
    album_id VARCHAR(36) PRIMARY KEY,
    image BYTEA NOT NULL,
    profile JSONB NOT NULL
)
"#;

// Append-only: no uniqueness beyond the surrogate key, duplicates from
// redelivered queue entries are tolerated rather than deduplicated.
const REVIEWS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS reviews (
    id BIGSERIAL PRIMARY KEY,
    album_id VARCHAR(36) NOT NULL,
    action VARCHAR(10) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;
