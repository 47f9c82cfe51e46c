use super::{MatchStore, PromotionTx};
use crate::entities::match_record::{MatchCounts, MatchInsert, MatchRecord};
use crate::entities::travel_post::{TravelPost, TravelPostInsert};
use crate::entities::traveler::{CandidateFilter, Traveler};
use crate::entities::trip::Trip;
use crate::entities::{MatchStatus, PostStatus};
use crate::error::StoreError;
use crate::utils::utc_now;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// In-process [`MatchStore`].
///
/// All state sits behind one mutex. A promotion transaction holds that mutex
/// from `begin` until commit or drop and works on a staged copy, so
/// concurrent promotions serialize the way they would on a locked post row.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Clone, Default)]
struct MemoryState {
    travelers: HashMap<Uuid, Traveler>,
    posts: HashMap<Uuid, TravelPost>,
    matches: HashMap<Uuid, MatchRecord>,
    trips: HashMap<Uuid, Trip>,
    last_timestamp: Option<time::PrimitiveDateTime>,
    faults: Faults,
}

#[derive(Clone, Default)]
struct Faults {
    trip_insert: bool,
    trip_insert_posts: HashSet<Uuid>,
    match_insert_users: HashSet<Uuid>,
}

impl MemoryState {
    /// Strictly increasing timestamps, so newest-first ordering is stable.
    fn next_timestamp(&mut self) -> time::PrimitiveDateTime {
        let now = utc_now();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + time::Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }

    fn insert_match(&mut self, insert: MatchInsert) -> Result<MatchRecord, StoreError> {
        if self.faults.match_insert_users.contains(&insert.user_id) {
            return Err(StoreError::Unavailable(format!(
                "injected match insert failure for user {}",
                insert.user_id
            )));
        }
        let duplicate = self
            .matches
            .values()
            .any(|m| m.user_id == insert.user_id && m.post_id == insert.post_id);
        if duplicate {
            return Err(StoreError::UniqueViolation(
                "matches_user_id_post_id_key".to_string(),
            ));
        }
        let record = MatchRecord {
            id: Uuid::now_v7(),
            user_id: insert.user_id,
            post_id: insert.post_id,
            match_score: insert.match_score,
            status: insert.status,
            created_at: self.next_timestamp(),
        };
        self.matches.insert(record.id, record.clone());
        Ok(record)
    }

    fn find_accepted(&self, post_id: Uuid, user_id: Uuid) -> Option<MatchRecord> {
        self.matches
            .values()
            .find(|m| {
                m.post_id == post_id && m.user_id == user_id && m.status == MatchStatus::Accepted
            })
            .cloned()
    }
}

fn newest_first(mut matches: Vec<MatchRecord>) -> Vec<MatchRecord> {
    matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    matches
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a traveler profile.
    pub async fn put_traveler(&self, traveler: Traveler) {
        self.state
            .lock()
            .await
            .travelers
            .insert(traveler.id, traveler);
    }

    /// Make every subsequent trip insert fail.
    pub async fn fail_trip_inserts(&self, fail: bool) {
        self.state.lock().await.faults.trip_insert = fail;
    }

    /// Make trip inserts for `post_id` fail.
    pub async fn fail_trip_inserts_for(&self, post_id: Uuid) {
        self.state
            .lock()
            .await
            .faults
            .trip_insert_posts
            .insert(post_id);
    }

    /// Make match inserts for `user_id` fail with a non-constraint error.
    pub async fn fail_match_inserts_for(&self, user_id: Uuid) {
        self.state
            .lock()
            .await
            .faults
            .match_insert_users
            .insert(user_id);
    }

    /// Number of trips created for `post_id`.
    pub async fn trip_count_for_post(&self, post_id: Uuid) -> usize {
        self.state
            .lock()
            .await
            .trips
            .values()
            .filter(|t| t.post_id == post_id)
            .count()
    }

    /// The trip created for `post_id`, if any.
    pub async fn trip_for_post(&self, post_id: Uuid) -> Option<Trip> {
        self.state
            .lock()
            .await
            .trips
            .values()
            .find(|t| t.post_id == post_id)
            .cloned()
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn get_post(&self, post_id: Uuid) -> Result<Option<TravelPost>, StoreError> {
        Ok(self.state.lock().await.posts.get(&post_id).cloned())
    }

    async fn publish_post(
        &self,
        post: TravelPostInsert,
        seat_score: i16,
    ) -> Result<(TravelPost, MatchRecord), StoreError> {
        let mut state = self.state.lock().await;
        let record = TravelPost {
            id: Uuid::now_v7(),
            creator_id: post.creator_id,
            destination: post.destination,
            start_date: post.start_date,
            end_date: post.end_date,
            description: post.description,
            budget: post.budget,
            travel_style: post.travel_style,
            requirements: post.requirements,
            status: PostStatus::Active,
            created_at: state.next_timestamp(),
        };
        let seat = state.insert_match(MatchInsert {
            user_id: record.creator_id,
            post_id: record.id,
            match_score: seat_score,
            status: MatchStatus::Accepted,
        })?;
        state.posts.insert(record.id, record.clone());
        Ok((record, seat))
    }

    async fn get_traveler(&self, user_id: Uuid) -> Result<Option<Traveler>, StoreError> {
        Ok(self.state.lock().await.travelers.get(&user_id).cloned())
    }

    async fn find_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Traveler>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .travelers
            .values()
            .filter(|t| filter.admits(t))
            .cloned()
            .collect())
    }

    async fn get_match(&self, match_id: Uuid) -> Result<Option<MatchRecord>, StoreError> {
        Ok(self.state.lock().await.matches.get(&match_id).cloned())
    }

    async fn find_match(
        &self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MatchRecord>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .matches
            .values()
            .find(|m| m.post_id == post_id && m.user_id == user_id)
            .cloned())
    }

    async fn insert_match(&self, insert: MatchInsert) -> Result<MatchRecord, StoreError> {
        self.state.lock().await.insert_match(insert)
    }

    async fn resolve_pending_match(
        &self,
        match_id: Uuid,
        status: MatchStatus,
    ) -> Result<Option<MatchRecord>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(record) = state.matches.get_mut(&match_id) else {
            return Ok(None);
        };
        if record.status.is_terminal() {
            return Ok(None);
        }
        record.status = status;
        Ok(Some(record.clone()))
    }

    async fn list_matches_for_post(
        &self,
        post_id: Uuid,
        status: Option<MatchStatus>,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        let state = self.state.lock().await;
        let matches = state
            .matches
            .values()
            .filter(|m| m.post_id == post_id && status.is_none_or(|s| m.status == s))
            .cloned()
            .collect();
        Ok(newest_first(matches))
    }

    async fn list_matches_for_user(&self, user_id: Uuid) -> Result<Vec<MatchRecord>, StoreError> {
        let state = self.state.lock().await;
        let matches = state
            .matches
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(matches))
    }

    async fn match_counts(&self, post_id: Uuid) -> Result<MatchCounts, StoreError> {
        let state = self.state.lock().await;
        let mut counts = MatchCounts::default();
        for m in state.matches.values().filter(|m| m.post_id == post_id) {
            counts.add(m.status, 1);
        }
        Ok(counts)
    }

    async fn get_trip(&self, trip_id: Uuid) -> Result<Option<Trip>, StoreError> {
        Ok(self.state.lock().await.trips.get(&trip_id).cloned())
    }

    async fn find_unpromoted_acceptances(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        let state = self.state.lock().await;
        let mut matches: Vec<MatchRecord> = state
            .matches
            .values()
            .filter(|m| m.status == MatchStatus::Accepted)
            .filter(|m| {
                state
                    .posts
                    .get(&m.post_id)
                    .is_some_and(|p| p.is_active() && p.creator_id != m.user_id)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matches
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn begin(&self) -> Result<Box<dyn PromotionTx>, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryPromotionTx { guard, staged }))
    }
}

/// Staged copy of the store plus the guard that keeps everyone else out.
pub struct MemoryPromotionTx {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl PromotionTx for MemoryPromotionTx {
    async fn get_match(&mut self, match_id: Uuid) -> Result<Option<MatchRecord>, StoreError> {
        Ok(self.staged.matches.get(&match_id).cloned())
    }

    async fn get_post_for_update(
        &mut self,
        post_id: Uuid,
    ) -> Result<Option<TravelPost>, StoreError> {
        Ok(self.staged.posts.get(&post_id).cloned())
    }

    async fn find_accepted_match(
        &mut self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MatchRecord>, StoreError> {
        Ok(self.staged.find_accepted(post_id, user_id))
    }

    async fn insert_trip(
        &mut self,
        post_id: Uuid,
        participants: &[Uuid],
    ) -> Result<Trip, StoreError> {
        let faults = &self.staged.faults;
        if faults.trip_insert || faults.trip_insert_posts.contains(&post_id) {
            return Err(StoreError::Unavailable(
                "injected trip insert failure".to_string(),
            ));
        }
        if self.staged.trips.values().any(|t| t.post_id == post_id) {
            return Err(StoreError::UniqueViolation("trips_post_id_key".to_string()));
        }
        let trip = Trip {
            id: Uuid::now_v7(),
            post_id,
            participants: participants.to_vec(),
            itinerary: Vec::new(),
            created_at: self.staged.next_timestamp(),
        };
        self.staged.trips.insert(trip.id, trip.clone());
        Ok(trip)
    }

    async fn close_post(&mut self, post_id: Uuid) -> Result<bool, StoreError> {
        match self.staged.posts.get_mut(&post_id) {
            Some(post) if post.status == PostStatus::Active => {
                post.status = PostStatus::Closed;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryPromotionTx { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
