pub mod matches;
pub mod notifications;
pub mod posts;
pub mod profile;
pub mod trips;
pub mod ws;

pub use matches::{
    FindMatchesResponse, MatchListQuery, MatchSort, MatchStatus, MatchView, PotentialMatch,
    RespondToMatchRequest, RespondToMatchResponse,
};
pub use notifications::{NotificationKind, NotificationPayload};
pub use posts::{
    MatchSummary, PostResponse, PostStatus, PublishPostRequest, PublishPostResponse,
    Requirements, TravelDates,
};
pub use profile::{Gender, GenderPreference};
pub use trips::{ItineraryEntry, TripResponse};

use serde::{Deserialize, Serialize};

/// Machine-readable error category carried in every error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Conflict,
    Forbidden,
    InvalidOperation,
    Unauthorized,
    TransactionFailure,
    Internal,
}

/// JSON body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    /// Human-readable explanation, safe to show to end users.
    pub message: String,
    /// Underlying error string. Only populated by debug builds of the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}
