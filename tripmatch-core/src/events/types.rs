//! Event type definitions.

use tripmatch_sdk::objects::{MatchStatus as SdkMatchStatus, NotificationKind, NotificationPayload};
use uuid::Uuid;

use crate::entities::MatchStatus;

/// A notification addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub payload: NotificationPayload,
}

impl Notification {
    /// Tell a post creator their post is live.
    pub fn new_post(user_id: Uuid, post_id: Uuid, destination: &str) -> Self {
        Self {
            user_id,
            kind: NotificationKind::NewPost,
            payload: NotificationPayload::new(
                post_id,
                format!("your trip to {destination} is now open for companions"),
            ),
        }
    }

    /// A match now exists for `user_id` to look at.
    pub fn new_match(
        user_id: Uuid,
        post_id: Uuid,
        match_id: Uuid,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            kind: NotificationKind::NewMatch,
            payload: NotificationPayload::new(post_id, message)
                .with_match(match_id, SdkMatchStatus::Pending),
        }
    }

    /// The status of `user_id`'s match changed.
    pub fn match_update(user_id: Uuid, post_id: Uuid, match_id: Uuid, status: MatchStatus) -> Self {
        let message = match status {
            MatchStatus::Accepted => "your request to join the trip was accepted",
            MatchStatus::Rejected => "your request to join the trip was declined",
            MatchStatus::Pending => "your request to join the trip is pending",
        };
        Self {
            user_id,
            kind: NotificationKind::MatchUpdate,
            payload: NotificationPayload::new(post_id, message)
                .with_match(match_id, status.into()),
        }
    }

    /// A trip was formed on `post_id` with `user_id` among the participants.
    pub fn trip_formed(user_id: Uuid, post_id: Uuid, trip_id: Uuid) -> Self {
        Self {
            user_id,
            kind: NotificationKind::MatchUpdate,
            payload: NotificationPayload::new(post_id, "your trip is confirmed")
                .with_trip(trip_id),
        }
    }
}

/// What the dispatcher broadcasts to connected sockets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Forward to the socket(s) of `Notification::user_id` only.
    Notify(Notification),
    /// The set of online users changed; every socket receives it.
    OnlineUsers(Vec<Uuid>),
}
