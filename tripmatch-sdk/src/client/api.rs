//! Typed HTTP client for the Tripmatch REST API.

use reqwest::Client;
use url::Url;
use uuid::Uuid;

use super::{ClientError, NotificationStream};
use crate::identity::{USER_ID_HEADER, WS_USER_ID_PARAM};
use crate::objects::{
    ErrorResponse, FindMatchesResponse, MatchListQuery, MatchSort, MatchView, PostResponse,
    PublishPostRequest, PublishPostResponse, RespondToMatchRequest, RespondToMatchResponse,
    TripResponse,
};

/// Client acting on behalf of one authenticated user.
///
/// Every request carries the user's id in the `Tripmatch-User-Id` header.
/// Whoever constructs the client is responsible for having authenticated
/// that user.
#[derive(Debug, Clone)]
pub struct TripmatchClient {
    http: Client,
    base_url: Url,
    user_id: Uuid,
}

impl TripmatchClient {
    pub fn new(base_url: Url, user_id: Uuid) -> Self {
        Self {
            http: Client::new(),
            base_url,
            user_id,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// A client sharing this one's connection pool but acting as `user_id`.
    pub fn as_user(&self, user_id: Uuid) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            user_id,
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// `POST /api/v1/posts` – publish a travel post and run matching for it.
    pub async fn publish_post(
        &self,
        request: &PublishPostRequest,
    ) -> Result<PublishPostResponse, ClientError> {
        let url = self.base_url.join("/api/v1/posts")?;
        let resp = self
            .http
            .post(url)
            .header(USER_ID_HEADER, self.user_id.to_string())
            .json(request)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/posts/{post_id}`
    pub async fn get_post(&self, post_id: Uuid) -> Result<PostResponse, ClientError> {
        let url = self.base_url.join(&format!("/api/v1/posts/{post_id}"))?;
        let resp = self
            .http
            .get(url)
            .header(USER_ID_HEADER, self.user_id.to_string())
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/posts/{post_id}/matches` – ask to join a post.
    pub async fn request_match(&self, post_id: Uuid) -> Result<MatchView, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/posts/{post_id}/matches"))?;
        let resp = self
            .http
            .post(url)
            .header(USER_ID_HEADER, self.user_id.to_string())
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/posts/{post_id}/matches` – list a post's matches.
    pub async fn list_matches(
        &self,
        post_id: Uuid,
        query: MatchListQuery,
    ) -> Result<Vec<MatchView>, ClientError> {
        let mut url = self
            .base_url
            .join(&format!("/api/v1/posts/{post_id}/matches"))?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(status) = query.status {
                pairs.append_pair("status", &status.to_string());
            }
            let sort = match query.sort {
                MatchSort::Newest => "newest",
                MatchSort::Oldest => "oldest",
                MatchSort::Score => "score",
            };
            pairs.append_pair("sort", sort);
        }
        let resp = self
            .http
            .get(url)
            .header(USER_ID_HEADER, self.user_id.to_string())
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/posts/{post_id}/matches/{match_id}/respond` – accept or
    /// reject a pending match. Only the post creator may call this.
    pub async fn respond_to_match(
        &self,
        post_id: Uuid,
        match_id: Uuid,
        response: impl Into<String>,
    ) -> Result<RespondToMatchResponse, ClientError> {
        let path = format!("/api/v1/posts/{post_id}/matches/{match_id}/respond");
        let url = self.base_url.join(&path)?;
        let resp = self
            .http
            .post(url)
            .header(USER_ID_HEADER, self.user_id.to_string())
            .json(&RespondToMatchRequest {
                response: response.into(),
            })
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/posts/{post_id}/find-matches` – re-run candidate search.
    pub async fn find_matches(&self, post_id: Uuid) -> Result<FindMatchesResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/posts/{post_id}/find-matches"))?;
        let resp = self
            .http
            .post(url)
            .header(USER_ID_HEADER, self.user_id.to_string())
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/matches/mine` – every match involving the caller.
    pub async fn my_matches(&self) -> Result<Vec<MatchView>, ClientError> {
        let url = self.base_url.join("/api/v1/matches/mine")?;
        let resp = self
            .http
            .get(url)
            .header(USER_ID_HEADER, self.user_id.to_string())
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/trips/{trip_id}`
    pub async fn get_trip(&self, trip_id: Uuid) -> Result<TripResponse, ClientError> {
        let url = self.base_url.join(&format!("/api/v1/trips/{trip_id}"))?;
        let resp = self
            .http
            .get(url)
            .header(USER_ID_HEADER, self.user_id.to_string())
            .send()
            .await?;
        parse_response(resp).await
    }

    /// Open the real-time notification stream for this user.
    pub async fn notifications(&self) -> Result<NotificationStream, ClientError> {
        let mut url = self.base_url.join("/api/v1/ws")?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        // http(s) -> ws(s) is always an allowed scheme change for special schemes
        let _ = url.set_scheme(scheme);
        url.query_pairs_mut()
            .append_pair(WS_USER_ID_PARAM, &self.user_id.to_string());
        NotificationStream::connect(url.as_str()).await
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let error = serde_json::from_str::<ErrorResponse>(&body).ok();
        return Err(ClientError::Api {
            status,
            body,
            error,
        });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}
