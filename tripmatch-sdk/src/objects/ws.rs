//! WebSocket message types for the notification stream.
//!
//! `GET /api/v1/ws?user_id={uuid}` upgrades to a WebSocket that pushes
//! [`WsServerMessage`] JSON frames.
//!
//! # Protocol
//!
//! 1. Right after the upgrade every connected client receives an
//!    [`WsServerMessage::OnlineUsers`] frame, and receives another one each
//!    time a user connects or disconnects.
//! 2. [`WsServerMessage::Notification`] frames are pushed for events
//!    addressed to the connected user.
//! 3. Client frames are ignored apart from close frames.
//! 4. A missing or malformed `user_id` gets an error frame followed by a
//!    close frame with [`WsCloseCode::INVALID_USER`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::notifications::{NotificationKind, NotificationPayload};

/// Server-to-client WebSocket message, tagged by `"type"`:
///
/// ```json
/// {"type":"notification","kind":"new_match","payload":{ ... }}
/// {"type":"online_users","user_ids":[ ... ]}
/// {"type":"error","code":4001,"reason":"invalid user id"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsServerMessage {
    Notification {
        kind: NotificationKind,
        payload: NotificationPayload,
    },
    OnlineUsers {
        user_ids: Vec<Uuid>,
    },
    Error {
        code: u16,
        reason: String,
    },
}

/// Close codes used by the notification stream.
///
/// Codes in the 4000–4999 range are reserved for application use by
/// [RFC 6455 §7.4.2](https://www.rfc-editor.org/rfc/rfc6455#section-7.4.2).
pub struct WsCloseCode;

impl WsCloseCode {
    pub const NORMAL: u16 = 1000;

    pub const INTERNAL_ERROR: u16 = 1011;

    /// The `user_id` query parameter was missing or not a UUID.
    pub const INVALID_USER: u16 = 4001;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_frame_shape() {
        let post_id = Uuid::new_v4();
        let msg = WsServerMessage::Notification {
            kind: NotificationKind::NewMatch,
            payload: NotificationPayload::new(post_id, "someone wants to join your trip"),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "notification");
        assert_eq!(json["kind"], "new_match");
        assert_eq!(json["payload"]["post_id"], post_id.to_string());
        assert!(json["payload"].get("trip_id").is_none());

        let back: WsServerMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }
}
