/// Request/response bodies for the HTTP surface
use serde::Serialize;

/// Body returned by POST /albums.
#[derive(Debug, Serialize)]
pub struct AlbumCreatedResponse {
    #[serde(rename = "albumID")]
    pub album_id: String,
    #[serde(rename = "imageSize")]
    pub image_size: String,
}

/// Body returned by POST /review/{action}/{albumID}. A 201 acknowledges the
/// enqueue only; persistence happens later in the review worker.
#[derive(Debug, Serialize)]
pub struct ReviewAcceptedResponse {
    pub msg: &'static str,
}

impl ReviewAcceptedResponse {
    pub fn accepted() -> Self {
        Self {
            msg: "Review accepted",
        }
    }
}
