//! HTTP error mapping.
//!
//! Every failure leaves the server as a JSON [`ErrorResponse`]. The
//! `debug` field carries the underlying error chain in debug builds only.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tripmatch_core::error::MatchingError;
use tripmatch_sdk::objects::{ErrorCode, ErrorResponse};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Matching(#[from] MatchingError),

    /// Missing or malformed caller identity.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl ApiError {
    /// Shorthand for a malformed identifier or request body.
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::Matching(MatchingError::invalid(message))
    }

    fn classify(&self) -> (StatusCode, ErrorCode, String) {
        match self {
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, msg.clone())
            }
            ApiError::Matching(err) => match err {
                MatchingError::NotFound(what) => (
                    StatusCode::NOT_FOUND,
                    ErrorCode::NotFound,
                    format!("{what} not found"),
                ),
                MatchingError::Conflict(msg) => {
                    (StatusCode::BAD_REQUEST, ErrorCode::Conflict, msg.clone())
                }
                MatchingError::Forbidden(msg) => {
                    (StatusCode::FORBIDDEN, ErrorCode::Forbidden, msg.clone())
                }
                MatchingError::InvalidOperation(msg) => (
                    StatusCode::BAD_REQUEST,
                    ErrorCode::InvalidOperation,
                    msg.clone(),
                ),
                MatchingError::TransactionFailure(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::TransactionFailure,
                    "trip could not be created, please retry".to_string(),
                ),
                MatchingError::MatchingFailed { .. } | MatchingError::Storage(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Internal,
                    "internal server error".to_string(),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.classify();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let debug = if cfg!(debug_assertions) {
            Some(error_chain(&self))
        } else {
            None
        };

        let body = ErrorResponse {
            code,
            message,
            debug,
        };
        (status, Json(body)).into_response()
    }
}

pub(super) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
