//! Public API handlers, mounted under `/api/v1`.
//!
//! Every endpoint except the WebSocket takes the caller's id from the
//! `Tripmatch-User-Id` header.
//!
//! # Endpoints
//!
//! - `POST /posts`                                        – publish a post
//! - `GET  /posts/{post_id}`                              – post with match summary
//! - `POST /posts/{post_id}/matches`                      – request to join a post
//! - `GET  /posts/{post_id}/matches`                      – list matches of a post
//! - `POST /posts/{post_id}/matches/{match_id}/respond`   – accept or reject
//! - `POST /posts/{post_id}/find-matches`                 – re-run matching
//! - `GET  /matches/mine`                                 – caller's match history
//! - `GET  /trips/{trip_id}`                              – trip with itinerary
//! - `GET  /ws?user_id={uuid}`                            – notification stream

use axum::{
    Router,
    routing::{get, post},
};
use time::PrimitiveDateTime;
use tripmatch_core::entities::match_record::{MatchCounts, MatchRecord};
use tripmatch_core::entities::travel_post::TravelPost;
use tripmatch_core::entities::trip::Trip;
use tripmatch_core::processors::PotentialMatch as ScoredCandidate;
use tripmatch_sdk::objects::{
    ItineraryEntry, MatchSummary, MatchView, PostResponse, PotentialMatch, Requirements,
    TravelDates, TripResponse,
};

use crate::state::AppState;

pub mod error;
pub mod extractors;
mod matches;
mod posts;
mod trips;
mod ws;

#[cfg(test)]
mod tests;

/// Build the public API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", post(posts::publish_post))
        .route("/posts/{post_id}", get(posts::get_post))
        .route(
            "/posts/{post_id}/matches",
            post(matches::request_match).get(matches::list_matches),
        )
        .route(
            "/posts/{post_id}/matches/{match_id}/respond",
            post(matches::respond_to_match),
        )
        .route("/posts/{post_id}/find-matches", post(posts::find_matches))
        .route("/matches/mine", get(matches::my_matches))
        .route("/trips/{trip_id}", get(trips::get_trip))
        .route("/ws", get(ws::notifications_ws))
}

fn unix(at: PrimitiveDateTime) -> i64 {
    at.assume_utc().unix_timestamp()
}

/// Convert a `TravelPost` (DB model) into a `PostResponse` (API model).
fn to_post_response(post: &TravelPost, counts: MatchCounts) -> PostResponse {
    PostResponse {
        post_id: post.id,
        creator_id: post.creator_id,
        destination: post.destination.clone(),
        travel_dates: TravelDates {
            start: post.start_date,
            end: post.end_date,
        },
        description: post.description.clone(),
        budget: post.budget,
        travel_style: post.travel_style.clone(),
        requirements: post.requirements.map(|r| Requirements {
            min_age: r.min_age,
            max_age: r.max_age,
            gender_preference: r.gender_preference.into(),
        }),
        status: post.status.into(),
        created_at: unix(post.created_at),
        match_summary: MatchSummary {
            pending: counts.pending,
            accepted: counts.accepted,
            rejected: counts.rejected,
        },
    }
}

fn to_match_view(record: &MatchRecord) -> MatchView {
    MatchView {
        match_id: record.id,
        post_id: record.post_id,
        user_id: record.user_id,
        // stored scores are CHECKed to 0..=100
        match_score: u8::try_from(record.match_score.clamp(0, 100)).unwrap_or_default(),
        status: record.status.into(),
        created_at: unix(record.created_at),
    }
}

fn to_trip_response(trip: &Trip) -> TripResponse {
    TripResponse {
        trip_id: trip.id,
        post_id: trip.post_id,
        participants: trip.participants.clone(),
        itinerary: trip
            .itinerary
            .iter()
            .map(|entry| ItineraryEntry {
                activity: entry.activity.clone(),
                date: entry.date,
            })
            .collect(),
        created_at: unix(trip.created_at),
    }
}

fn to_potential_matches(scored: &[ScoredCandidate]) -> Vec<PotentialMatch> {
    scored
        .iter()
        .map(|c| PotentialMatch {
            user_id: c.user_id,
            match_score: c.match_score,
        })
        .collect()
}
