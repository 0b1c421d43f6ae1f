/// Shared wire contract for the review queue.
///
/// The album service (producer) and the review worker (consumer) both depend
/// on this crate, so the queue naming, entry fields, and message shape are
/// agreed in one versioned artifact instead of by convention.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Current wire schema version, stamped on every stream entry.
pub const SCHEMA_VERSION: u32 = 1;

/// Stream the producer publishes to and the worker group reads from.
pub const REVIEW_STREAM: &str = "reviewQueue";

/// Consumer group shared by all review worker instances.
pub const REVIEW_GROUP: &str = "review-workers";

/// Dead-letter stream for poison and retry-exhausted entries.
pub const REVIEW_DEAD_STREAM: &str = "reviewQueue:dead";

/// Content type tag carried alongside the payload on each entry.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// A like or dislike verdict on an album.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Like,
    Dislike,
}

impl ReviewAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewAction::Like => "like",
            ReviewAction::Dislike => "dislike",
        }
    }
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewAction {
    type Err = InvalidAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(ReviewAction::Like),
            "dislike" => Ok(ReviewAction::Dislike),
            other => Err(InvalidAction(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid review action {0:?}, expected \"like\" or \"dislike\"")]
pub struct InvalidAction(pub String);

/// One review as it travels through the queue.
///
/// Immutable once published and carries no identity beyond its content, so
/// duplicates from redelivery are indistinguishable and tolerated downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewMessage {
    #[serde(rename = "albumID")]
    pub album_id: String,
    pub action: ReviewAction,
}

impl ReviewMessage {
    pub fn new(album_id: impl Into<String>, action: ReviewAction) -> Self {
        Self {
            album_id: album_id.into(),
            action,
        }
    }

    /// Serialize to the JSON wire body.
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Decode a wire body. Any structural mismatch means the entry is poison:
    /// it will never decode on a later attempt either.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(payload)?)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("malformed review payload: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_like_message() {
        let msg = ReviewMessage::decode(br#"{"albumID":"ALBUM-1","action":"like"}"#).unwrap();
        assert_eq!(msg.album_id, "ALBUM-1");
        assert_eq!(msg.action, ReviewAction::Like);
    }

    #[test]
    fn wire_body_uses_agreed_keys() {
        let msg = ReviewMessage::new("ALBUM-1", ReviewAction::Like);
        let body = String::from_utf8(msg.encode().unwrap()).unwrap();
        assert_eq!(body, r#"{"albumID":"ALBUM-1","action":"like"}"#);
    }

    #[test]
    fn rejects_unknown_action_value() {
        let err = ReviewMessage::decode(br#"{"albumID":"ALBUM-1","action":"love"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_non_json_payload() {
        assert!(ReviewMessage::decode(b"not json at all").is_err());
    }

    #[test]
    fn action_parse_matches_wire_values() {
        assert_eq!("like".parse::<ReviewAction>().unwrap(), ReviewAction::Like);
        assert_eq!(
            "dislike".parse::<ReviewAction>().unwrap(),
            ReviewAction::Dislike
        );
        assert!("love".parse::<ReviewAction>().is_err());
        // Case-sensitive on purpose: the wire format is lowercase.
        assert!("Like".parse::<ReviewAction>().is_err());
    }
}
