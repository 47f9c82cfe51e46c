//! Real-time notification payloads.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::matches::MatchStatus;

/// Event type of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A post was published.
    NewPost,
    /// A new match exists: an opportunity for a candidate, or a join
    /// request for a post creator.
    NewMatch,
    /// A match was accepted or rejected, or a trip was formed from it.
    MatchUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub post_id: Uuid,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MatchStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<Uuid>,
}

impl NotificationPayload {
    /// A payload carrying only the post reference and a message.
    pub fn new(post_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            post_id,
            message: message.into(),
            match_id: None,
            status: None,
            trip_id: None,
        }
    }

    pub fn with_match(mut self, match_id: Uuid, status: MatchStatus) -> Self {
        self.match_id = Some(match_id);
        self.status = Some(status);
        self
    }

    pub fn with_trip(mut self, trip_id: Uuid) -> Self {
        self.trip_id = Some(trip_id);
        self
    }
}
