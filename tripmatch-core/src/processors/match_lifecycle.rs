//! MatchLifecycle processor.
//!
//! Owns the per-match state machine: `pending` → `accepted` | `rejected`,
//! both terminal. Users create matches by requesting to join a post; only
//! the post creator moves them out of `pending`. Every acceptance runs
//! [`TripPromotion`] before the response is returned.

use crate::config::MatchingConfig;
use crate::entities::MatchStatus;
use crate::entities::match_record::{MatchInsert, MatchRecord};
use crate::entities::trip::Trip;
use crate::error::{MatchingError, Missing};
use crate::events::{Notification, Notifier};
use crate::processors::trip_promotion::{PromoteToTrip, TripPromotion};
use crate::store::MatchStore;
use crate::utils::compatibility;
use kanau::processor::Processor;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use tripmatch_sdk::objects::MatchSort;
use uuid::Uuid;

const DUPLICATE_MATCH: &str = "a match for this post already exists";
const ALREADY_ANSWERED: &str = "match has already been answered";

#[derive(Clone)]
pub struct MatchLifecycle {
    store: Arc<dyn MatchStore>,
    notifier: Arc<dyn Notifier>,
    config: Arc<RwLock<MatchingConfig>>,
    promotion: TripPromotion,
}

impl MatchLifecycle {
    pub fn new(
        store: Arc<dyn MatchStore>,
        notifier: Arc<dyn Notifier>,
        config: Arc<RwLock<MatchingConfig>>,
    ) -> Self {
        let promotion = TripPromotion::new(store.clone(), notifier.clone());
        Self {
            store,
            notifier,
            config,
            promotion,
        }
    }
}

/// The creator's answer to a pending match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDecision {
    Accept,
    Reject,
}

impl MatchDecision {
    /// Parse a raw response value.
    ///
    /// Strict parsing takes exactly `accept` or `reject`. Lenient parsing
    /// treats everything except `accept` as a rejection.
    pub fn parse(raw: &str, strict: bool) -> Result<Self, MatchingError> {
        match raw {
            "accept" => Ok(MatchDecision::Accept),
            "reject" => Ok(MatchDecision::Reject),
            _ if strict => Err(MatchingError::invalid(format!(
                "response must be \"accept\" or \"reject\", got {raw:?}"
            ))),
            _ => Ok(MatchDecision::Reject),
        }
    }

    pub fn status(self) -> MatchStatus {
        match self {
            MatchDecision::Accept => MatchStatus::Accepted,
            MatchDecision::Reject => MatchStatus::Rejected,
        }
    }
}

/// A user asks to join a post.
#[derive(Debug, Clone, Copy)]
pub struct RequestMatch {
    pub post_id: Uuid,
    pub user_id: Uuid,
}

impl Processor<RequestMatch> for MatchLifecycle {
    type Output = MatchRecord;
    type Error = MatchingError;
    #[tracing::instrument(skip_all, err, fields(post_id = %cmd.post_id, user_id = %cmd.user_id))]
    async fn process(&self, cmd: RequestMatch) -> Result<MatchRecord, MatchingError> {
        let post = self
            .store
            .get_post(cmd.post_id)
            .await?
            .ok_or(MatchingError::NotFound(Missing::Post(cmd.post_id)))?;

        if post.creator_id == cmd.user_id {
            return Err(MatchingError::invalid(
                "cannot request a match on your own post",
            ));
        }

        let existing = self.store.find_match(post.id, cmd.user_id).await?;
        if existing.is_some() {
            return Err(MatchingError::conflict(DUPLICATE_MATCH));
        }

        let match_score = match self.store.get_traveler(cmd.user_id).await? {
            Some(traveler) => compatibility::score(&traveler, &post),
            None => 0,
        };

        let record = self
            .store
            .insert_match(MatchInsert {
                user_id: cmd.user_id,
                post_id: post.id,
                match_score: i16::from(match_score),
                status: MatchStatus::Pending,
            })
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    MatchingError::conflict(DUPLICATE_MATCH)
                } else {
                    MatchingError::Storage(e)
                }
            })?;

        info!(match_id = %record.id, match_score, "Match requested");
        self.notifier.emit(Notification::new_match(
            post.creator_id,
            post.id,
            record.id,
            "a traveler wants to join your trip",
        ));
        Ok(record)
    }
}

/// The post creator answers a pending match.
#[derive(Debug, Clone)]
pub struct RespondToMatch {
    pub post_id: Uuid,
    pub match_id: Uuid,
    pub response: String,
    pub acting_user: Uuid,
}

/// A resolved match, plus the trip when the acceptance completed a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResolution {
    pub record: MatchRecord,
    pub trip: Option<Trip>,
}

impl Processor<RespondToMatch> for MatchLifecycle {
    type Output = MatchResolution;
    type Error = MatchingError;
    #[tracing::instrument(skip_all, err, fields(post_id = %cmd.post_id, match_id = %cmd.match_id))]
    async fn process(&self, cmd: RespondToMatch) -> Result<MatchResolution, MatchingError> {
        let post = self
            .store
            .get_post(cmd.post_id)
            .await?
            .ok_or(MatchingError::NotFound(Missing::Post(cmd.post_id)))?;

        if post.creator_id != cmd.acting_user {
            return Err(MatchingError::forbidden(
                "only the post creator can respond to matches",
            ));
        }

        let existing = self
            .store
            .get_match(cmd.match_id)
            .await?
            .filter(|m| m.post_id == post.id)
            .ok_or(MatchingError::NotFound(Missing::Match(cmd.match_id)))?;

        let strict = self.config.read().await.strict_responses;
        let decision = MatchDecision::parse(&cmd.response, strict)?;

        let record = self
            .store
            .resolve_pending_match(existing.id, decision.status())
            .await?
            .ok_or_else(|| MatchingError::conflict(ALREADY_ANSWERED))?;
        info!(status = ?record.status, "Match resolved");

        let promotion = match decision {
            MatchDecision::Accept => {
                self.promotion
                    .process(PromoteToTrip {
                        match_id: record.id,
                        acting_user: cmd.acting_user,
                    })
                    .await
            }
            MatchDecision::Reject => Ok(None),
        };

        self.notifier.emit(Notification::match_update(
            record.user_id,
            record.post_id,
            record.id,
            record.status,
        ));

        match promotion {
            Ok(trip) => Ok(MatchResolution { record, trip }),
            Err(e) => {
                warn!(error = %e, "Match accepted but trip promotion failed");
                Err(e)
            }
        }
    }
}

/// List a post's matches. Visible to the creator and to users holding an
/// accepted match on the post.
#[derive(Debug, Clone, Copy)]
pub struct ListMatchedUsers {
    pub post_id: Uuid,
    pub acting_user: Uuid,
    pub status: Option<MatchStatus>,
    pub sort: MatchSort,
}

impl Processor<ListMatchedUsers> for MatchLifecycle {
    type Output = Vec<MatchRecord>;
    type Error = MatchingError;
    async fn process(&self, query: ListMatchedUsers) -> Result<Vec<MatchRecord>, MatchingError> {
        let post = self
            .store
            .get_post(query.post_id)
            .await?
            .ok_or(MatchingError::NotFound(Missing::Post(query.post_id)))?;

        if post.creator_id != query.acting_user {
            let own = self.store.find_match(post.id, query.acting_user).await?;
            if !own.is_some_and(|m| m.status == MatchStatus::Accepted) {
                return Err(MatchingError::forbidden(
                    "only the post creator or matched users can view matches",
                ));
            }
        }

        let mut matches = self
            .store
            .list_matches_for_post(post.id, query.status)
            .await?;
        sort_matches(&mut matches, query.sort);
        Ok(matches)
    }
}

/// Order matches that arrive newest first.
fn sort_matches(matches: &mut [MatchRecord], sort: MatchSort) {
    match sort {
        MatchSort::Newest => matches.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        MatchSort::Oldest => matches.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        MatchSort::Score => matches.sort_by(|a, b| {
            b.match_score
                .cmp(&a.match_score)
                .then(b.created_at.cmp(&a.created_at))
        }),
    }
}

/// Every match of a user across all posts, newest first.
#[derive(Debug, Clone, Copy)]
pub struct ListUserMatches {
    pub user_id: Uuid,
}

impl Processor<ListUserMatches> for MatchLifecycle {
    type Output = Vec<MatchRecord>;
    type Error = MatchingError;
    async fn process(&self, query: ListUserMatches) -> Result<Vec<MatchRecord>, MatchingError> {
        Ok(self.store.list_matches_for_user(query.user_id).await?)
    }
}
