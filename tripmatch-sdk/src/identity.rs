//! Caller identity propagation.
//!
//! Authentication happens in front of Tripmatch (gateway or session layer).
//! The authenticated user's id is forwarded on every request in
//! [`USER_ID_HEADER`]; the WebSocket endpoint takes it as the `user_id` query
//! parameter instead, since browsers cannot set headers on upgrade requests.

use uuid::Uuid;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "Tripmatch-User-Id";

/// Query parameter carrying the user id on the WebSocket endpoint.
pub const WS_USER_ID_PARAM: &str = "user_id";

/// Parse a user id as sent in [`USER_ID_HEADER`].
///
/// Surrounding whitespace is ignored; anything that is not a UUID is `None`.
pub fn parse_user_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}
