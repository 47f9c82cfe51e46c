//! Trip response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItineraryEntry {
    pub activity: String,
    pub date: time::Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripResponse {
    pub trip_id: Uuid,
    pub post_id: Uuid,
    /// Distinct participant ids; always at least two.
    pub participants: Vec<Uuid>,
    pub itinerary: Vec<ItineraryEntry>,
    /// Unix timestamp of when the trip was created.
    pub created_at: i64,
}
