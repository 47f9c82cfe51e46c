use super::{MatchStore, PromotionTx};
use crate::entities::MatchStatus;
use crate::entities::match_record::{
    CountMatchesByStatus, FindUnpromotedAcceptances, GetMatchById, GetMatchForPostAndUser,
    InsertMatch, ListMatchesForPost, ListMatchesForUser, MatchCounts, MatchInsert, MatchRecord,
    ResolvePendingMatch,
};
use crate::entities::travel_post::{GetTravelPostById, TravelPost, TravelPostInsert};
use crate::entities::traveler::{CandidateFilter, FindCandidateTravelers, GetTravelerById, Traveler};
use crate::entities::trip::{GetTripById, Trip};
use crate::error::StoreError;
use crate::framework::DatabaseProcessor;
use async_trait::async_trait;
use kanau::processor::Processor;
use sqlx::PgPool;
use uuid::Uuid;

/// [`MatchStore`] backed by Postgres.
#[derive(Clone)]
pub struct PgMatchStore {
    db: DatabaseProcessor,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            db: DatabaseProcessor { pool },
        }
    }
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn get_post(&self, post_id: Uuid) -> Result<Option<TravelPost>, StoreError> {
        Ok(self.db.process(GetTravelPostById { post_id }).await?)
    }

    async fn publish_post(
        &self,
        post: TravelPostInsert,
        seat_score: i16,
    ) -> Result<(TravelPost, MatchRecord), StoreError> {
        let mut tx = self.db.pool.begin().await?;
        let post = TravelPost::insert_tx(&mut tx, post).await?;
        let seat = MatchRecord::insert_tx(
            &mut tx,
            MatchInsert {
                user_id: post.creator_id,
                post_id: post.id,
                match_score: seat_score,
                status: MatchStatus::Accepted,
            },
        )
        .await?;
        tx.commit().await?;
        Ok((post, seat))
    }

    async fn get_traveler(&self, user_id: Uuid) -> Result<Option<Traveler>, StoreError> {
        Ok(self.db.process(GetTravelerById { user_id }).await?)
    }

    async fn find_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Traveler>, StoreError> {
        Ok(self
            .db
            .process(FindCandidateTravelers {
                filter: filter.clone(),
            })
            .await?)
    }

    async fn get_match(&self, match_id: Uuid) -> Result<Option<MatchRecord>, StoreError> {
        Ok(self.db.process(GetMatchById { match_id }).await?)
    }

    async fn find_match(
        &self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MatchRecord>, StoreError> {
        Ok(self
            .db
            .process(GetMatchForPostAndUser { post_id, user_id })
            .await?)
    }

    async fn insert_match(&self, insert: MatchInsert) -> Result<MatchRecord, StoreError> {
        Ok(self.db.process(InsertMatch { insert }).await?)
    }

    async fn resolve_pending_match(
        &self,
        match_id: Uuid,
        status: MatchStatus,
    ) -> Result<Option<MatchRecord>, StoreError> {
        Ok(self
            .db
            .process(ResolvePendingMatch { match_id, status })
            .await?)
    }

    async fn list_matches_for_post(
        &self,
        post_id: Uuid,
        status: Option<MatchStatus>,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        Ok(self
            .db
            .process(ListMatchesForPost { post_id, status })
            .await?)
    }

    async fn list_matches_for_user(&self, user_id: Uuid) -> Result<Vec<MatchRecord>, StoreError> {
        Ok(self.db.process(ListMatchesForUser { user_id }).await?)
    }

    async fn match_counts(&self, post_id: Uuid) -> Result<MatchCounts, StoreError> {
        Ok(self.db.process(CountMatchesByStatus { post_id }).await?)
    }

    async fn get_trip(&self, trip_id: Uuid) -> Result<Option<Trip>, StoreError> {
        Ok(self.db.process(GetTripById { trip_id }).await?)
    }

    async fn find_unpromoted_acceptances(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        let query = FindUnpromotedAcceptances {
            limit: i64::from(limit),
            offset: i64::from(offset),
        };
        Ok(self.db.process(query).await?)
    }

    async fn begin(&self) -> Result<Box<dyn PromotionTx>, StoreError> {
        let tx = self.db.pool.begin().await?;
        Ok(Box::new(PgPromotionTx { tx }))
    }
}

/// Postgres transaction. Dropping it without `commit` rolls back.
pub struct PgPromotionTx {
    tx: sqlx::Transaction<'static, sqlx::Postgres>,
}

#[async_trait]
impl PromotionTx for PgPromotionTx {
    async fn get_match(&mut self, match_id: Uuid) -> Result<Option<MatchRecord>, StoreError> {
        Ok(MatchRecord::get_by_id_tx(&mut self.tx, match_id).await?)
    }

    async fn get_post_for_update(
        &mut self,
        post_id: Uuid,
    ) -> Result<Option<TravelPost>, StoreError> {
        Ok(TravelPost::get_for_update_tx(&mut self.tx, post_id).await?)
    }

    async fn find_accepted_match(
        &mut self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MatchRecord>, StoreError> {
        Ok(MatchRecord::find_accepted_tx(&mut self.tx, post_id, user_id).await?)
    }

    async fn insert_trip(
        &mut self,
        post_id: Uuid,
        participants: &[Uuid],
    ) -> Result<Trip, StoreError> {
        Ok(Trip::insert_tx(&mut self.tx, post_id, participants).await?)
    }

    async fn close_post(&mut self, post_id: Uuid) -> Result<bool, StoreError> {
        Ok(TravelPost::close_tx(&mut self.tx, post_id).await?)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
