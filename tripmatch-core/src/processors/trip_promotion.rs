//! TripPromotion processor.
//!
//! Turns a pair of accepted matches on the same post into a trip and closes
//! the post, inside one store transaction:
//!
//! 1. Re-read the triggering match and lock its post
//! 2. Work out the other party: the match's user when the creator acts,
//!    the creator otherwise
//! 3. Require an accepted match for both the acting user and the other party
//! 4. Insert the trip with both users and an empty itinerary, close the post
//! 5. Commit, then notify both participants
//!
//! A closed post or a missing counterpart commits without a trip. Any storage
//! failure drops the transaction, which discards the trip and the status
//! change together. The acceptance that triggered the promotion was written
//! before the transaction began and is kept either way; the
//! `PromotionSweeper` retries such acceptances later.

use crate::entities::MatchStatus;
use crate::entities::trip::{Trip, distinct_participants};
use crate::error::MatchingError::TransactionFailure;
use crate::error::{MatchingError, Missing};
use crate::events::{Notification, Notifier};
use crate::store::{MatchStore, PromotionTx};
use kanau::processor::Processor;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct TripPromotion {
    store: Arc<dyn MatchStore>,
    notifier: Arc<dyn Notifier>,
}

impl TripPromotion {
    pub fn new(store: Arc<dyn MatchStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    async fn promote(&self, cmd: &PromoteToTrip) -> Result<Option<Trip>, MatchingError> {
        let mut tx = self.store.begin().await.map_err(TransactionFailure)?;

        let record = tx
            .get_match(cmd.match_id)
            .await
            .map_err(TransactionFailure)?
            .ok_or(MatchingError::NotFound(Missing::Match(cmd.match_id)))?;

        let post = tx
            .get_post_for_update(record.post_id)
            .await
            .map_err(TransactionFailure)?
            .ok_or(MatchingError::NotFound(Missing::Post(record.post_id)))?;

        if !post.is_active() {
            debug!(post_id = %post.id, "Post already closed, no promotion");
            return finish_without_trip(tx).await;
        }
        if record.status != MatchStatus::Accepted {
            debug!(
                match_id = %record.id,
                status = ?record.status,
                "Match not accepted, no promotion"
            );
            return finish_without_trip(tx).await;
        }

        let other = if cmd.acting_user == post.creator_id {
            record.user_id
        } else {
            post.creator_id
        };
        if other == cmd.acting_user {
            debug!(post_id = %post.id, user_id = %other, "Self match, no promotion");
            return finish_without_trip(tx).await;
        }

        for user_id in [cmd.acting_user, other] {
            let accepted = tx
                .find_accepted_match(post.id, user_id)
                .await
                .map_err(TransactionFailure)?;
            if accepted.is_none() {
                debug!(
                    post_id = %post.id,
                    user_id = %user_id,
                    "No accepted match yet, no promotion"
                );
                return finish_without_trip(tx).await;
            }
        }

        let participants = distinct_participants([cmd.acting_user, other]);
        let trip = tx
            .insert_trip(post.id, &participants)
            .await
            .map_err(TransactionFailure)?;
        tx.close_post(post.id).await.map_err(TransactionFailure)?;
        tx.commit().await.map_err(TransactionFailure)?;

        info!(post_id = %post.id, trip_id = %trip.id, "Trip created, post closed");
        Ok(Some(trip))
    }
}

async fn finish_without_trip(tx: Box<dyn PromotionTx>) -> Result<Option<Trip>, MatchingError> {
    tx.commit().await.map_err(TransactionFailure)?;
    Ok(None)
}

/// Try to promote the accepted match `match_id` to a trip on behalf of
/// `acting_user`.
#[derive(Debug, Clone, Copy)]
pub struct PromoteToTrip {
    pub match_id: Uuid,
    pub acting_user: Uuid,
}

impl Processor<PromoteToTrip> for TripPromotion {
    type Output = Option<Trip>;
    type Error = MatchingError;
    #[tracing::instrument(skip_all, err, fields(match_id = %cmd.match_id))]
    async fn process(&self, cmd: PromoteToTrip) -> Result<Option<Trip>, MatchingError> {
        let trip = self.promote(&cmd).await?;
        if let Some(trip) = &trip {
            for user_id in &trip.participants {
                self.notifier
                    .emit(Notification::trip_formed(*user_id, trip.post_id, trip.id));
            }
        }
        Ok(trip)
    }
}

/// Read a trip. Only its participants may.
#[derive(Debug, Clone, Copy)]
pub struct GetTripForParticipant {
    pub trip_id: Uuid,
    pub acting_user: Uuid,
}

impl Processor<GetTripForParticipant> for TripPromotion {
    type Output = Trip;
    type Error = MatchingError;
    async fn process(&self, query: GetTripForParticipant) -> Result<Trip, MatchingError> {
        let trip = self
            .store
            .get_trip(query.trip_id)
            .await?
            .ok_or(MatchingError::NotFound(Missing::Trip(query.trip_id)))?;
        if !trip.has_participant(query.acting_user) {
            return Err(MatchingError::forbidden(
                "only trip participants can view a trip",
            ));
        }
        Ok(trip)
    }
}
