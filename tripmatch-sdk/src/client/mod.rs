//! HTTP and WebSocket clients for the Tripmatch API.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the shared types do not pull in `reqwest`.

mod api;
mod stream;

pub use api::TripmatchClient;
pub use stream::NotificationStream;

use reqwest::StatusCode;

use crate::objects::ErrorResponse;

/// Errors produced by the SDK clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    ///
    /// `error` is the decoded error body when the server sent one.
    #[error("api error: status {status}, body: {body}")]
    Api {
        status: StatusCode,
        body: String,
        error: Option<ErrorResponse>,
    },

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// WebSocket handshake or frame failure.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The server closed the notification stream with an error frame.
    #[error("stream closed by server: {code} {reason}")]
    Closed { code: u16, reason: String },
}
