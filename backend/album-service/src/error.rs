/// Error types for the album service.
///
/// Errors raised on the HTTP path are converted to responses through
/// `ResponseError`; the worker logs them and settles the queue entry instead.
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Result type for album-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("queue error: {0}")]
    Queue(#[from] redis::RedisError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_)
            | AppError::Database(_)
            | AppError::Queue(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Callers only get a verdict on their own request; broker and store
        // failures stay opaque.
        let message = match self {
            AppError::Validation(_) | AppError::NotFound(_) => self.to_string(),
            AppError::Queue(_) => "failed to enqueue review".to_string(),
            AppError::Database(_) => "storage error".to_string(),
            AppError::Config(_) | AppError::Internal(_) => "internal server error".to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
