//! Travel post request and response types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::matches::PotentialMatch;
use super::profile::GenderPreference;

/// Inclusive travel date range. `start` must not be after `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelDates {
    pub start: time::Date,
    pub end: time::Date,
}

/// Companion requirements attached to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    pub min_age: i32,
    pub max_age: i32,
    pub gender_preference: GenderPreference,
}

/// Post lifecycle. Moves from `Active` to `Closed` once, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Active,
    Closed,
}

/// Request body for `POST /api/v1/posts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishPostRequest {
    pub destination: String,
    pub travel_dates: TravelDates,
    #[serde(default)]
    pub description: Option<String>,
    pub budget: Decimal,
    #[serde(default)]
    pub travel_style: Option<String>,
    #[serde(default)]
    pub requirements: Option<Requirements>,
}

/// Match counts per status, shown alongside a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub pending: u32,
    pub accepted: u32,
    pub rejected: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostResponse {
    pub post_id: Uuid,
    pub creator_id: Uuid,
    pub destination: String,
    pub travel_dates: TravelDates,
    pub description: Option<String>,
    pub budget: Decimal,
    pub travel_style: Option<String>,
    pub requirements: Option<Requirements>,
    pub status: PostStatus,
    /// Unix timestamp of when the post was created.
    pub created_at: i64,
    pub match_summary: MatchSummary,
}

/// Response of `POST /api/v1/posts`.
///
/// Matching runs as part of publishing. If it fails the post still exists;
/// `matching_error` then says why no candidates are listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishPostResponse {
    pub post: PostResponse,
    pub potential_matches: Vec<PotentialMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_error: Option<String>,
    /// Underlying error chain of a matching failure, debug builds only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_debug: Option<String>,
}
