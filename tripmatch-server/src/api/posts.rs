use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use kanau::processor::Processor;
use tripmatch_core::entities::MatchStatus;
use tripmatch_core::entities::match_record::MatchCounts;
use tripmatch_core::entities::travel_post::Requirements;
use tripmatch_core::error::MatchingError;
use tripmatch_core::processors::{GetPostSummary, PublishTravelPost, RerunMatching};
use tripmatch_sdk::objects::{FindMatchesResponse, PublishPostRequest, PublishPostResponse};

use super::error::{ApiError, error_chain};
use super::extractors::{ActingUser, ApiJson, parse_id};
use super::{to_post_response, to_potential_matches};
use crate::state::AppState;

/// Shown to clients when matching fails after the post was stored.
const MATCHING_FAILED_MESSAGE: &str = "matching failed; run find-matches to retry";

/// `POST /posts`: publish a travel post.
///
/// Matching runs before the response is sent. A matching failure does not
/// fail the request: the post exists and `matching_error` explains why the
/// candidate list is empty. Store details only reach `matching_debug` in
/// debug builds.
pub(super) async fn publish_post(
    state: State<AppState>,
    ActingUser(creator_id): ActingUser,
    ApiJson(body): ApiJson<PublishPostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let published = state
        .publisher
        .process(PublishTravelPost {
            creator_id,
            destination: body.destination,
            start_date: body.travel_dates.start,
            end_date: body.travel_dates.end,
            description: body.description,
            budget: body.budget,
            travel_style: body.travel_style,
            requirements: body.requirements.map(|r| Requirements {
                min_age: r.min_age,
                max_age: r.max_age,
                gender_preference: r.gender_preference.into(),
            }),
        })
        .await?;

    let mut counts = MatchCounts::default();
    counts.add(published.seat.status, 1);

    let mut matching_error = None;
    let mut matching_debug = None;
    let potential_matches = match &published.matching {
        Ok(outcome) => {
            counts.add(
                MatchStatus::Pending,
                u32::try_from(outcome.created.len()).unwrap_or(u32::MAX),
            );
            to_potential_matches(&outcome.potential_matches)
        }
        Err(e) => {
            if let MatchingError::MatchingFailed { created, .. } = e {
                counts.add(
                    MatchStatus::Pending,
                    u32::try_from(*created).unwrap_or(u32::MAX),
                );
            }
            tracing::warn!(post_id = %published.post.id, error = %e, "Matching failed on publish");
            matching_error = Some(MATCHING_FAILED_MESSAGE.to_string());
            if cfg!(debug_assertions) {
                matching_debug = Some(error_chain(e));
            }
            Vec::new()
        }
    };

    let body = PublishPostResponse {
        post: to_post_response(&published.post, counts),
        potential_matches,
        matching_error,
        matching_debug,
    };
    Ok((StatusCode::CREATED, Json(body)))
}

/// `GET /posts/{post_id}`: a post with its match counts.
pub(super) async fn get_post(
    state: State<AppState>,
    _user: ActingUser,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = parse_id(&post_id, "post")?;
    let summary = state.publisher.process(GetPostSummary { post_id }).await?;
    Ok(Json(to_post_response(&summary.post, summary.counts)))
}

/// `POST /posts/{post_id}/find-matches`: run matching again.
///
/// Only the creator may trigger it. Candidates who already hold a match are
/// listed again but not duplicated.
pub(super) async fn find_matches(
    state: State<AppState>,
    ActingUser(acting_user): ActingUser,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = parse_id(&post_id, "post")?;
    let outcome = state
        .finder
        .process(RerunMatching {
            post_id,
            acting_user,
        })
        .await?;
    Ok(Json(FindMatchesResponse {
        potential_matches: to_potential_matches(&outcome.potential_matches),
        created: u32::try_from(outcome.created.len()).unwrap_or(u32::MAX),
    }))
}
