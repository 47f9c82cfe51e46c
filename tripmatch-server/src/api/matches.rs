use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use kanau::processor::Processor;
use tripmatch_core::processors::{ListMatchedUsers, ListUserMatches, RequestMatch, RespondToMatch};
use tripmatch_sdk::objects::{
    MatchListQuery, MatchView, RespondToMatchRequest, RespondToMatchResponse,
};

use super::error::ApiError;
use super::extractors::{ActingUser, ApiJson, ApiQuery, parse_id};
use super::{to_match_view, to_trip_response};
use crate::state::AppState;

/// `POST /posts/{post_id}/matches`: ask to join a post.
pub(super) async fn request_match(
    state: State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = parse_id(&post_id, "post")?;
    let record = state
        .lifecycle
        .process(RequestMatch { post_id, user_id })
        .await?;
    Ok((StatusCode::CREATED, Json(to_match_view(&record))))
}

/// `GET /posts/{post_id}/matches?status=&sort=`: matches of a post.
///
/// Visible to the creator and to users already accepted on the post.
pub(super) async fn list_matches(
    state: State<AppState>,
    ActingUser(acting_user): ActingUser,
    Path(post_id): Path<String>,
    ApiQuery(query): ApiQuery<MatchListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = parse_id(&post_id, "post")?;
    let records = state
        .lifecycle
        .process(ListMatchedUsers {
            post_id,
            acting_user,
            status: query.status.map(Into::into),
            sort: query.sort,
        })
        .await?;
    let views: Vec<MatchView> = records.iter().map(to_match_view).collect();
    Ok(Json(views))
}

/// `POST /posts/{post_id}/matches/{match_id}/respond`: accept or reject.
///
/// An acceptance that completes a pair also returns the new trip. If the
/// trip could not be created the acceptance stays and the request fails
/// with `transaction_failure`; the sweeper retries the promotion later.
pub(super) async fn respond_to_match(
    state: State<AppState>,
    ActingUser(acting_user): ActingUser,
    Path((post_id, match_id)): Path<(String, String)>,
    ApiJson(body): ApiJson<RespondToMatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = parse_id(&post_id, "post")?;
    let match_id = parse_id(&match_id, "match")?;
    let resolution = state
        .lifecycle
        .process(RespondToMatch {
            post_id,
            match_id,
            response: body.response,
            acting_user,
        })
        .await?;
    Ok(Json(RespondToMatchResponse {
        match_view: to_match_view(&resolution.record),
        trip: resolution.trip.as_ref().map(to_trip_response),
    }))
}

/// `GET /matches/mine`: every match of the caller, newest first.
pub(super) async fn my_matches(
    state: State<AppState>,
    ActingUser(user_id): ActingUser,
) -> Result<impl IntoResponse, ApiError> {
    let records = state.lifecycle.process(ListUserMatches { user_id }).await?;
    let views: Vec<MatchView> = records.iter().map(to_match_view).collect();
    Ok(Json(views))
}
