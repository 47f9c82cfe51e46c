use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use kanau::processor::Processor;
use tripmatch_core::processors::GetTripForParticipant;

use super::error::ApiError;
use super::extractors::{ActingUser, parse_id};
use super::to_trip_response;
use crate::state::AppState;

/// `GET /trips/{trip_id}`: a trip and its itinerary, for participants only.
pub(super) async fn get_trip(
    state: State<AppState>,
    ActingUser(acting_user): ActingUser,
    Path(trip_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let trip_id = parse_id(&trip_id, "trip")?;
    let trip = state
        .promotion
        .process(GetTripForParticipant {
            trip_id,
            acting_user,
        })
        .await?;
    Ok(Json(to_trip_response(&trip)))
}
