/// Review repository - append-only writes for consumed review messages
use crate::error::Result;
use review_schema::ReviewMessage;
use sqlx::PgPool;

pub async fn insert_review(pool: &PgPool, review: &ReviewMessage) -> Result<()> {
    sqlx::query("INSERT INTO reviews (album_id, action) VALUES ($1, $2)")
        .bind(&review.album_id)
        .bind(review.action.as_str())
        .execute(pool)
        .await?;
    Ok(())
}
