//! Custom Axum extractors.
//!
//! Provides:
//! - `ActingUser`: the caller's id, forwarded by the gateway in the
//!   `Tripmatch-User-Id` header.
//! - `ApiJson<T>` / `ApiQuery<T>`: `Json` and `Query` whose rejections are
//!   reported as JSON `invalid_operation` errors instead of plain text.
//! - `parse_id`: path identifier parsing with the same error shape.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use tripmatch_sdk::identity::{USER_ID_HEADER, parse_user_id};
use uuid::Uuid;

use super::error::ApiError;

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for ActingUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| unauthorized("missing"))?
            .to_str()
            .map_err(|_| unauthorized("invalid"))?;
        parse_user_id(raw)
            .map(ActingUser)
            .ok_or_else(|| unauthorized("invalid"))
    }
}

fn unauthorized(problem: &str) -> ApiError {
    ApiError::Unauthorized(format!("{problem} {USER_ID_HEADER} header"))
}

/// JSON request body.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::invalid(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

/// Query string.
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::invalid(rejection.body_text()))?;
        Ok(ApiQuery(value))
    }
}

/// Parse an identifier taken from the path.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::invalid(format!("malformed {what} id: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    async fn extract(header: Option<&str>) -> Result<ActingUser, ApiError> {
        let mut builder = HttpRequest::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        ActingUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_acting_user_from_header() {
        let id = Uuid::new_v4();
        let header = id.to_string();
        assert_eq!(extract(Some(&header)).await.unwrap(), ActingUser(id));
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header_is_unauthorized() {
        assert!(matches!(
            extract(None).await,
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            extract(Some("alice")).await,
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "post").unwrap(), id);
        assert!(matches!(
            parse_id("42", "post"),
            Err(ApiError::Matching(
                tripmatch_core::error::MatchingError::InvalidOperation(_)
            ))
        ));
    }
}
