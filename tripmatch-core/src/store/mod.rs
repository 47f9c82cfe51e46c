//! Storage seam for the matching subsystem.
//!
//! Processors only talk to [`MatchStore`]. [`PgMatchStore`] is the
//! production implementation; [`MemoryStore`] runs the same operations in
//! process and backs the unit tests.
//!
//! Trip promotion is the one read-modify-write sequence that needs
//! isolation. It runs through a [`PromotionTx`] obtained from
//! [`MatchStore::begin`]: writes made through it become visible only on
//! [`PromotionTx::commit`], and dropping it without committing discards them.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgMatchStore;

use crate::entities::MatchStatus;
use crate::entities::match_record::{MatchCounts, MatchInsert, MatchRecord};
use crate::entities::travel_post::{TravelPost, TravelPostInsert};
use crate::entities::traveler::{CandidateFilter, Traveler};
use crate::entities::trip::Trip;
use crate::error::StoreError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn get_post(&self, post_id: Uuid) -> Result<Option<TravelPost>, StoreError>;

    /// Insert a post together with its creator's seat: an accepted match of
    /// the creator on the new post. Both rows are written or neither is.
    async fn publish_post(
        &self,
        post: TravelPostInsert,
        seat_score: i16,
    ) -> Result<(TravelPost, MatchRecord), StoreError>;

    async fn get_traveler(&self, user_id: Uuid) -> Result<Option<Traveler>, StoreError>;

    async fn find_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Traveler>, StoreError>;

    async fn get_match(&self, match_id: Uuid) -> Result<Option<MatchRecord>, StoreError>;

    async fn find_match(
        &self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MatchRecord>, StoreError>;

    /// Fails with [`StoreError::UniqueViolation`] when the pair already has
    /// a match.
    async fn insert_match(&self, insert: MatchInsert) -> Result<MatchRecord, StoreError>;

    /// Set a terminal status on a match that is still pending.
    ///
    /// `None` means the match does not exist or was already answered.
    async fn resolve_pending_match(
        &self,
        match_id: Uuid,
        status: MatchStatus,
    ) -> Result<Option<MatchRecord>, StoreError>;

    /// Newest first.
    async fn list_matches_for_post(
        &self,
        post_id: Uuid,
        status: Option<MatchStatus>,
    ) -> Result<Vec<MatchRecord>, StoreError>;

    /// Newest first.
    async fn list_matches_for_user(&self, user_id: Uuid) -> Result<Vec<MatchRecord>, StoreError>;

    async fn match_counts(&self, post_id: Uuid) -> Result<MatchCounts, StoreError>;

    async fn get_trip(&self, trip_id: Uuid) -> Result<Option<Trip>, StoreError>;

    /// Accepted non-creator matches on active posts, oldest first, skipping
    /// the first `offset`.
    async fn find_unpromoted_acceptances(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MatchRecord>, StoreError>;

    async fn begin(&self) -> Result<Box<dyn PromotionTx>, StoreError>;
}

/// An open trip-promotion transaction.
#[async_trait]
pub trait PromotionTx: Send {
    async fn get_match(&mut self, match_id: Uuid) -> Result<Option<MatchRecord>, StoreError>;

    /// Fetch the post and lock it against concurrent promotions until the
    /// transaction ends.
    async fn get_post_for_update(&mut self, post_id: Uuid)
    -> Result<Option<TravelPost>, StoreError>;

    async fn find_accepted_match(
        &mut self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MatchRecord>, StoreError>;

    async fn insert_trip(&mut self, post_id: Uuid, participants: &[Uuid])
    -> Result<Trip, StoreError>;

    /// Returns whether the post was active before the call.
    async fn close_post(&mut self, post_id: Uuid) -> Result<bool, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
