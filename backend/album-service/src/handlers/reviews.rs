/// Review handlers - HTTP entry point for the producer side of the pipeline
use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::error::Result;
use crate::models::ReviewAcceptedResponse;
use crate::queue::ReviewQueue;
use crate::services::review_producer;

/// Submit a like/dislike for an album.
///
/// 201 acknowledges the enqueue only: the message is durable in the queue
/// but not yet persisted. 400 for an invalid action, 404 for an unknown
/// album, 500 when the broker cannot be reached.
pub async fn submit_review(
    pool: web::Data<PgPool>,
    queue: web::Data<ReviewQueue>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (action, album_id) = path.into_inner();

    review_producer::submit_review(pool.get_ref(), queue.get_ref(), &album_id, &action).await?;

    Ok(HttpResponse::Created().json(ReviewAcceptedResponse::accepted()))
}
