/// Album handlers - HTTP endpoints for album upload and profile retrieval
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::StreamExt;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db::album_repo;
use crate::error::{AppError, Result};
use crate::models::AlbumCreatedResponse;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

/// Upload an album: multipart form with an `image` part (binary asset) and a
/// `profile` part (JSON text). Mints the album ID server-side.
pub async fn create_album(pool: web::Data<PgPool>, mut payload: Multipart) -> Result<HttpResponse> {
    let mut image: Option<Vec<u8>> = None;
    let mut profile_raw: Option<Vec<u8>> = None;

    while let Some(field) = payload.next().await {
        let mut field =
            field.map_err(|e| AppError::Validation(format!("multipart error: {e}")))?;

        match field.name() {
            "image" => {
                let mut buf = Vec::new();
                while let Some(chunk) = field.next().await {
                    let data = chunk
                        .map_err(|e| AppError::Validation(format!("image read error: {e}")))?;
                    buf.extend_from_slice(&data);
                }
                image = Some(buf);
            }
            "profile" => {
                let mut buf = Vec::new();
                while let Some(chunk) = field.next().await {
                    let data = chunk
                        .map_err(|e| AppError::Validation(format!("profile read error: {e}")))?;
                    buf.extend_from_slice(&data);
                }
                profile_raw = Some(buf);
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let image = image
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| AppError::Validation("image is required".to_string()))?;

    let profile: serde_json::Value = match profile_raw {
        Some(raw) => serde_json::from_slice(&raw)
            .map_err(|_| AppError::Validation("profile must be valid JSON".to_string()))?,
        None => serde_json::json!({}),
    };

    let album_id = Uuid::new_v4().to_string();
    album_repo::insert_album(pool.get_ref(), &album_id, &image, &profile).await?;

    info!(%album_id, image_bytes = image.len(), "album stored");

    Ok(HttpResponse::Created().json(AlbumCreatedResponse {
        album_id,
        image_size: image.len().to_string(),
    }))
}

/// Fetch the stored profile for an album (never the image bytes).
pub async fn get_album(
    pool: web::Data<PgPool>,
    album_id: web::Path<String>,
) -> Result<HttpResponse> {
    let profile = album_repo::get_profile(pool.get_ref(), &album_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("album {album_id} not found")))?;

    Ok(HttpResponse::Ok().json(profile))
}
