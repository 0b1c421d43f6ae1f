//! Producer side of the review pipeline.
//!
//! Validates a review request and hands it to the broker. The enqueue, not
//! the eventual persistence, is the unit of acknowledgment: callers get a
//! verdict as soon as the publish returns and never hear about the worker.

use crate::db::album_repo;
use crate::error::{AppError, Result};
use crate::queue::ReviewQueue;
use async_trait::async_trait;
use review_schema::{InvalidAction, ReviewAction, ReviewMessage};
use sqlx::PgPool;
use tracing::info;

/// The only read of album state the producer needs: a bare existence check.
#[async_trait]
pub trait AlbumDirectory: Send + Sync {
    async fn album_exists(&self, album_id: &str) -> Result<bool>;
}

/// The only broker operation the producer needs: publish one message.
#[async_trait]
pub trait ReviewPublisher: Send + Sync {
    async fn publish_review(&self, message: &ReviewMessage) -> Result<()>;
}

#[async_trait]
impl AlbumDirectory for PgPool {
    async fn album_exists(&self, album_id: &str) -> Result<bool> {
        album_repo::album_exists(self, album_id).await
    }
}

#[async_trait]
impl ReviewPublisher for ReviewQueue {
    async fn publish_review(&self, message: &ReviewMessage) -> Result<()> {
        self.publish(message).await?;
        Ok(())
    }
}

/// Validate `(album_id, action)` and enqueue exactly one message.
///
/// Rejections (bad action, unknown album) publish nothing. A publish failure
/// surfaces to the caller as-is and is not retried here: retry is a
/// consumer-side concern for messages that already made it into the queue.
pub async fn submit_review(
    albums: &dyn AlbumDirectory,
    queue: &dyn ReviewPublisher,
    album_id: &str,
    action: &str,
) -> Result<ReviewMessage> {
    let action: ReviewAction = action
        .parse()
        .map_err(|err: InvalidAction| AppError::Validation(err.to_string()))?;

    if !albums.album_exists(album_id).await? {
        return Err(AppError::NotFound(format!("album {album_id} not found")));
    }

    let message = ReviewMessage::new(album_id, action);
    queue.publish_review(&message).await?;

    info!(album_id, action = action.as_str(), "review enqueued");
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeDirectory {
        known: Vec<String>,
    }

    #[async_trait]
    impl AlbumDirectory for FakeDirectory {
        async fn album_exists(&self, album_id: &str) -> Result<bool> {
            Ok(self.known.iter().any(|id| id == album_id))
        }
    }

    #[derive(Default)]
    struct FakeQueue {
        published: Mutex<Vec<ReviewMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl ReviewPublisher for FakeQueue {
        async fn publish_review(&self, message: &ReviewMessage) -> Result<()> {
            if self.fail {
                return Err(AppError::Internal("broker unreachable".into()));
            }
            self.published.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn directory_with(ids: &[&str]) -> FakeDirectory {
        FakeDirectory {
            known: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn invalid_action_is_rejected_without_publish() {
        let albums = directory_with(&["ALBUM-1"]);
        let queue = FakeQueue::default();

        let err = submit_review(&albums, &queue, "ALBUM-1", "love")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(queue.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_album_is_rejected_without_publish() {
        let albums = directory_with(&["ALBUM-1"]);
        let queue = FakeQueue::default();

        let err = submit_review(&albums, &queue, "GHOST", "like")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(queue.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn valid_review_publishes_exactly_one_message() {
        let albums = directory_with(&["ALBUM-1"]);
        let queue = FakeQueue::default();

        submit_review(&albums, &queue, "ALBUM-1", "like")
            .await
            .unwrap();

        let published = queue.published.lock().unwrap();
        assert_eq!(
            *published,
            vec![ReviewMessage::new("ALBUM-1", ReviewAction::Like)]
        );
    }

    #[tokio::test]
    async fn publish_failure_surfaces_without_retry() {
        let albums = directory_with(&["ALBUM-1"]);
        let queue = FakeQueue {
            fail: true,
            ..FakeQueue::default()
        };

        let err = submit_review(&albums, &queue, "ALBUM-1", "dislike")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert!(queue.published.lock().unwrap().is_empty());
    }
}
