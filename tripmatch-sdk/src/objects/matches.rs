//! Match request, response and listing types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::trips::TripResponse;

/// Match lifecycle: `Pending` moves to exactly one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Accepted,
    Rejected,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Pending => write!(f, "pending"),
            MatchStatus::Accepted => write!(f, "accepted"),
            MatchStatus::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchView {
    pub match_id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    /// Compatibility score in `0..=100`.
    pub match_score: u8,
    pub status: MatchStatus,
    /// Unix timestamp of when the match was created.
    pub created_at: i64,
}

/// A candidate that scored above the matching threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotentialMatch {
    pub user_id: Uuid,
    pub match_score: u8,
}

/// Response of `POST /api/v1/posts/{post_id}/find-matches`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindMatchesResponse {
    pub potential_matches: Vec<PotentialMatch>,
    /// How many of `potential_matches` got a new pending match on this run.
    pub created: u32,
}

/// Request body for `POST /api/v1/posts/{post_id}/matches/{match_id}/respond`.
///
/// `response` is kept as a raw string; the server decides how strictly to
/// interpret it (see the `[matching]` config section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondToMatchRequest {
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondToMatchResponse {
    #[serde(rename = "match")]
    pub match_view: MatchView,
    /// Present when this acceptance completed a pair and created a trip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip: Option<TripResponse>,
}

/// Ordering for match listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSort {
    #[default]
    Newest,
    Oldest,
    Score,
}

/// Query string of `GET /api/v1/posts/{post_id}/matches`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchListQuery {
    #[serde(default)]
    pub status: Option<MatchStatus>,
    #[serde(default)]
    pub sort: MatchSort,
}
