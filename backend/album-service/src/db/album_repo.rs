/// Album repository - database operations for albums
use crate::error::Result;
use sqlx::PgPool;

pub async fn insert_album(
    pool: &PgPool,
    album_id: &str,
    image: &[u8],
    profile: &serde_json::Value,
) -> Result<()> {
    sqlx::query("INSERT INTO albums (album_id, image, profile) VALUES ($1, $2, $3)")
        .bind(album_id)
        .bind(image)
        .bind(profile)
        .execute(pool)
        .await?;
    Ok(())
}

/// Fetch the stored profile only; the image bytes never leave this table
/// through the read path.
pub async fn get_profile(pool: &PgPool, album_id: &str) -> Result<Option<serde_json::Value>> {
    let profile =
        sqlx::query_scalar::<_, serde_json::Value>("SELECT profile FROM albums WHERE album_id = $1")
            .bind(album_id)
            .fetch_optional(pool)
            .await?;
    Ok(profile)
}

/// Point-in-time existence check. No lock, no reservation: a concurrent
/// delete can still race whatever the caller does next.
pub async fn album_exists(pool: &PgPool, album_id: &str) -> Result<bool> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM albums WHERE album_id = $1)")
            .bind(album_id)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}
