//! Frames carried by the real-time relay.
//!
//! Every frame is a JSON object `{"event": <name>, "data": {...}}`. The same
//! types are used by the server (`relay`) and by the follow widget client.

use serde::{Deserialize, Serialize};

/// Server → client events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum RelayEvent {
    Follow(EdgePayload),
    Unfollow(EdgePayload),
    UpdateFollowCounts(FollowCounts),
    CommentAdded(CommentAdded),
    /// Only ever sent to the connection that caused it.
    Error(ErrorNotice),
}

/// `userId` is the followed user, `followerId` the actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgePayload {
    pub user_id: String,
    pub follower_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowCounts {
    pub follower_id: String,
    pub followed_id: String,
    /// Followers of `followed_id` after the change
    pub follower_count: usize,
    /// Following of `follower_id` after the change
    pub following_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAdded {
    pub post_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
    pub message: String,
}

impl RelayEvent {
    pub fn error(message: impl Into<String>) -> Self {
        RelayEvent::Error(ErrorNotice { message: message.into() })
    }

    pub fn name(&self) -> &'static str {
        match self {
            RelayEvent::Follow(_) => "follow",
            RelayEvent::Unfollow(_) => "unfollow",
            RelayEvent::UpdateFollowCounts(_) => "updateFollowCounts",
            RelayEvent::CommentAdded(_) => "commentAdded",
            RelayEvent::Error(_) => "error",
        }
    }

    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_frame(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }
}

/// Client → server messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    FollowUser(EdgeRequest),
    UnfollowUser(EdgeRequest),
    CommentAdded(CommentAdded),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRequest {
    pub follower_id: String,
    pub followed_id: String,
}

impl ClientMessage {
    pub fn from_frame(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }
}
