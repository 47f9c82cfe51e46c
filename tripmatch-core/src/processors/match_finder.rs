//! MatchFinder processor.
//!
//! The MatchFinder is responsible for:
//! - Selecting candidate travelers that pass a post's filter criteria
//! - Scoring each candidate and keeping those above the threshold
//! - Creating a pending match for each kept candidate that has none yet
//! - Notifying each newly matched candidate
//!
//! Re-running it for the same post is safe: existing pairs are skipped, and
//! a pair created concurrently by a join request loses on the unique
//! constraint and is skipped too. Matches are created one by one, not in a
//! single transaction; a storage error stops the run and keeps what was
//! already created.

use crate::entities::MatchStatus;
use crate::entities::match_record::{MatchInsert, MatchRecord};
use crate::entities::traveler::CandidateFilter;
use crate::error::{MatchingError, Missing};
use crate::events::{Notification, Notifier};
use crate::store::MatchStore;
use crate::utils::compatibility::{above_threshold, score};
use kanau::processor::Processor;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct MatchFinder {
    store: Arc<dyn MatchStore>,
    notifier: Arc<dyn Notifier>,
}

impl MatchFinder {
    pub fn new(store: Arc<dyn MatchStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }
}

/// A candidate scoring above the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PotentialMatch {
    pub user_id: Uuid,
    pub match_score: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinderOutcome {
    /// Every candidate above the threshold, best score first, ties by user id.
    pub potential_matches: Vec<PotentialMatch>,
    /// Matches created by this run.
    pub created: Vec<MatchRecord>,
}

/// Find and persist candidates for a post.
#[derive(Debug, Clone, Copy)]
pub struct FindPotentialMatches {
    pub post_id: Uuid,
}

impl Processor<FindPotentialMatches> for MatchFinder {
    type Output = FinderOutcome;
    type Error = MatchingError;
    #[tracing::instrument(skip_all, err, fields(post_id = %query.post_id))]
    async fn process(&self, query: FindPotentialMatches) -> Result<FinderOutcome, MatchingError> {
        let post = self
            .store
            .get_post(query.post_id)
            .await?
            .ok_or(MatchingError::NotFound(Missing::Post(query.post_id)))?;

        let Some(requirements) = post.requirements else {
            debug!("Post has no requirements, nothing to match");
            return Ok(FinderOutcome::default());
        };
        if !post.is_active() {
            debug!("Post is closed, nothing to match");
            return Ok(FinderOutcome::default());
        }

        let filter = CandidateFilter {
            destination: post.destination.clone(),
            budget: post.budget,
            min_age: requirements.min_age,
            max_age: requirements.max_age,
            gender: requirements.gender_preference.required_gender(),
            exclude_user: post.creator_id,
        };
        let candidates = self
            .store
            .find_candidates(&filter)
            .await
            .map_err(|e| MatchingError::MatchingFailed {
                created: 0,
                source: e,
            })?;

        let mut potential_matches: Vec<PotentialMatch> = candidates
            .iter()
            .map(|traveler| PotentialMatch {
                user_id: traveler.id,
                match_score: score(traveler, &post),
            })
            .filter(|m| above_threshold(m.match_score))
            .collect();
        potential_matches.sort_by(|a, b| {
            b.match_score
                .cmp(&a.match_score)
                .then(a.user_id.cmp(&b.user_id))
        });

        let mut created = Vec::new();
        for candidate in &potential_matches {
            let existing = self
                .store
                .find_match(post.id, candidate.user_id)
                .await
                .map_err(|source| MatchingError::MatchingFailed {
                    created: created.len(),
                    source,
                })?;
            if existing.is_some() {
                continue;
            }

            let insert = MatchInsert {
                user_id: candidate.user_id,
                post_id: post.id,
                match_score: i16::from(candidate.match_score),
                status: MatchStatus::Pending,
            };
            match self.store.insert_match(insert).await {
                Ok(record) => {
                    self.notifier.emit(Notification::new_match(
                        record.user_id,
                        post.id,
                        record.id,
                        format!(
                            "a trip to {} looks like a good fit for you",
                            post.destination
                        ),
                    ));
                    created.push(record);
                }
                Err(e) if e.is_unique_violation() => {
                    debug!(user_id = %candidate.user_id, "Match created concurrently, skipping");
                }
                Err(source) => {
                    return Err(MatchingError::MatchingFailed {
                        created: created.len(),
                        source,
                    });
                }
            }
        }

        info!(
            candidates = candidates.len(),
            potential = potential_matches.len(),
            created = created.len(),
            "Matching finished"
        );
        Ok(FinderOutcome {
            potential_matches,
            created,
        })
    }
}

/// Run the finder again on behalf of the post creator.
#[derive(Debug, Clone, Copy)]
pub struct RerunMatching {
    pub post_id: Uuid,
    pub acting_user: Uuid,
}

impl Processor<RerunMatching> for MatchFinder {
    type Output = FinderOutcome;
    type Error = MatchingError;
    async fn process(&self, cmd: RerunMatching) -> Result<FinderOutcome, MatchingError> {
        let post = self
            .store
            .get_post(cmd.post_id)
            .await?
            .ok_or(MatchingError::NotFound(Missing::Post(cmd.post_id)))?;
        if post.creator_id != cmd.acting_user {
            return Err(MatchingError::forbidden(
                "only the post creator can run matching",
            ));
        }
        let query = FindPotentialMatches { post_id: post.id };
        self.process(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::traveler::Traveler;
    use crate::entities::{Gender, GenderPreference};
    use crate::store::MemoryStore;
    use crate::testing::{RecordingNotifier, paris_post, traveler_in_paris};
    use tripmatch_sdk::objects::NotificationKind;

    async fn setup(
        travelers: &[Traveler],
    ) -> (MemoryStore, Arc<RecordingNotifier>, MatchFinder, Uuid, Uuid) {
        let store = MemoryStore::new();
        for t in travelers {
            store.put_traveler(t.clone()).await;
        }
        let notifier = Arc::new(RecordingNotifier::default());
        let finder = MatchFinder::new(Arc::new(store.clone()), notifier.clone());
        let creator = Uuid::new_v4();
        let (post, _) = store.publish_post(paris_post(creator), 100).await.unwrap();
        (store, notifier, finder, creator, post.id)
    }

    async fn run(finder: &MatchFinder, post_id: Uuid) -> Result<FinderOutcome, MatchingError> {
        finder.process(FindPotentialMatches { post_id }).await
    }

    #[tokio::test]
    async fn test_alice_matched_bob_skipped() {
        let alice = traveler_in_paris(30);
        let mut bob = traveler_in_paris(50);
        if let Some(prefs) = bob.travel_preferences.as_mut() {
            prefs.destinations = vec!["Tokyo".to_string()];
        }
        let (store, notifier, finder, _, post_id) = setup(&[alice.clone(), bob.clone()]).await;

        let outcome = run(&finder, post_id).await.unwrap();
        assert_eq!(
            outcome.potential_matches,
            vec![PotentialMatch {
                user_id: alice.id,
                match_score: 100
            }]
        );
        assert_eq!(outcome.created.len(), 1);
        assert!(store.find_match(post_id, bob.id).await.unwrap().is_none());

        let notified = notifier.recorded();
        assert_eq!(notified.len(), 1);
        assert_eq!(notified[0].user_id, alice.id);
        assert_eq!(notified[0].kind, NotificationKind::NewMatch);
    }

    #[tokio::test]
    async fn test_rerun_creates_no_duplicates() {
        let alice = traveler_in_paris(30);
        let (store, _, finder, _, post_id) = setup(&[alice.clone()]).await;

        let first = run(&finder, post_id).await.unwrap();
        let second = run(&finder, post_id).await.unwrap();
        assert_eq!(first.created.len(), 1);
        assert!(second.created.is_empty());
        assert_eq!(second.potential_matches.len(), 1);

        let matches = store
            .list_matches_for_post(post_id, Some(MatchStatus::Pending))
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[tokio::test]
    async fn test_gender_preference_filters_candidates() {
        let mut no_gender = traveler_in_paris(30);
        no_gender.gender = None;
        let (store, _, finder, creator, _) = setup(&[no_gender.clone()]).await;

        let mut post = paris_post(creator);
        post.requirements = Some(crate::entities::travel_post::Requirements {
            min_age: 25,
            max_age: 40,
            gender_preference: GenderPreference::Female,
        });
        let (post, _) = store.publish_post(post, 100).await.unwrap();
        // the gender filter keeps her out of the candidate set entirely
        let outcome = run(&finder, post.id).await.unwrap();
        assert!(outcome.potential_matches.is_empty());

        let mut female = traveler_in_paris(30);
        female.gender = Some(Gender::Female);
        store.put_traveler(female.clone()).await;
        let outcome = run(&finder, post.id).await.unwrap();
        assert_eq!(outcome.potential_matches.len(), 1);
        assert!(outcome.potential_matches[0].match_score > 50);
    }

    #[tokio::test]
    async fn test_post_without_requirements_matches_nobody() {
        let alice = traveler_in_paris(30);
        let (store, _, finder, creator, _) = setup(&[alice]).await;
        let mut post = paris_post(creator);
        post.requirements = None;
        let (post, _) = store.publish_post(post, 100).await.unwrap();

        let outcome = run(&finder, post.id).await.unwrap();
        assert_eq!(outcome, FinderOutcome::default());
    }

    #[tokio::test]
    async fn test_missing_post_is_not_found() {
        let (_, _, finder, _, _) = setup(&[]).await;
        let err = run(&finder, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, MatchingError::NotFound(Missing::Post(_))));
    }

    #[tokio::test]
    async fn test_storage_failure_aborts_and_keeps_partial_matches() {
        let good = traveler_in_paris(30);
        let bad = traveler_in_paris(35);
        let (store, notifier, finder, _, post_id) = setup(&[good.clone(), bad.clone()]).await;
        store.fail_match_inserts_for(bad.id).await;

        let err = run(&finder, post_id).await.unwrap_err();
        let MatchingError::MatchingFailed { created, .. } = err else {
            panic!("unexpected error: {err:?}");
        };

        // equal scores are visited in user id order; `good` is kept only if
        // it came first
        let good_kept = store.find_match(post_id, good.id).await.unwrap().is_some();
        assert_eq!(good_kept, good.id < bad.id);
        assert_eq!(created, usize::from(good_kept));
        assert!(store.find_match(post_id, bad.id).await.unwrap().is_none());
        assert_eq!(notifier.recorded().len(), created);
    }

    #[tokio::test]
    async fn test_rerun_is_creator_only() {
        let (_, _, finder, creator, post_id) = setup(&[traveler_in_paris(30)]).await;
        let err = finder
            .process(RerunMatching {
                post_id,
                acting_user: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MatchingError::Forbidden(_)));

        let outcome = finder
            .process(RerunMatching {
                post_id,
                acting_user: creator,
            })
            .await
            .unwrap();
        assert_eq!(outcome.created.len(), 1);
    }
}
