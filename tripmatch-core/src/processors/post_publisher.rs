//! PostPublisher processor.
//!
//! Publishing a post writes the post and its creator's seat (an accepted
//! match of the creator, so the creator counts as one side of any trip),
//! tells the creator the post is live, then runs the [`MatchFinder`]. A
//! finder failure is reported alongside the published post; the post stays.

use crate::entities::match_record::{MatchCounts, MatchRecord};
use crate::entities::travel_post::{Requirements, TravelPost, TravelPostInsert};
use crate::error::{MatchingError, Missing};
use crate::events::{Notification, Notifier};
use crate::processors::match_finder::{FindPotentialMatches, FinderOutcome, MatchFinder};
use crate::store::MatchStore;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Score recorded on the creator's own seat.
pub const CREATOR_SEAT_SCORE: i16 = 100;

#[derive(Clone)]
pub struct PostPublisher {
    store: Arc<dyn MatchStore>,
    notifier: Arc<dyn Notifier>,
    finder: MatchFinder,
}

impl PostPublisher {
    pub fn new(store: Arc<dyn MatchStore>, notifier: Arc<dyn Notifier>) -> Self {
        let finder = MatchFinder::new(store.clone(), notifier.clone());
        Self {
            store,
            notifier,
            finder,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PublishTravelPost {
    pub creator_id: Uuid,
    pub destination: String,
    pub start_date: time::Date,
    pub end_date: time::Date,
    pub description: Option<String>,
    pub budget: Decimal,
    pub travel_style: Option<String>,
    pub requirements: Option<Requirements>,
}

impl PublishTravelPost {
    fn validate(&self) -> Result<(), MatchingError> {
        if self.destination.trim().is_empty() {
            return Err(MatchingError::invalid("destination must not be empty"));
        }
        if self.start_date > self.end_date {
            return Err(MatchingError::invalid(
                "travel start date is after its end date",
            ));
        }
        if self.budget.is_sign_negative() {
            return Err(MatchingError::invalid("budget must not be negative"));
        }
        if let Some(r) = &self.requirements {
            if r.min_age < 0 {
                return Err(MatchingError::invalid("minimum age must not be negative"));
            }
            if r.min_age > r.max_age {
                return Err(MatchingError::invalid("minimum age is above maximum age"));
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct PublishedPost {
    pub post: TravelPost,
    pub seat: MatchRecord,
    pub matching: Result<FinderOutcome, MatchingError>,
}

impl Processor<PublishTravelPost> for PostPublisher {
    type Output = PublishedPost;
    type Error = MatchingError;
    #[tracing::instrument(skip_all, err, fields(creator_id = %cmd.creator_id))]
    async fn process(&self, cmd: PublishTravelPost) -> Result<PublishedPost, MatchingError> {
        cmd.validate()?;
        let insert = TravelPostInsert {
            creator_id: cmd.creator_id,
            destination: cmd.destination.trim().to_string(),
            start_date: cmd.start_date,
            end_date: cmd.end_date,
            description: cmd.description,
            budget: cmd.budget,
            travel_style: cmd.travel_style,
            requirements: cmd.requirements,
        };
        let (post, seat) = self.store.publish_post(insert, CREATOR_SEAT_SCORE).await?;
        info!(post_id = %post.id, destination = %post.destination, "Post published");

        self.notifier.emit(Notification::new_post(
            post.creator_id,
            post.id,
            &post.destination,
        ));

        let matching = self
            .finder
            .process(FindPotentialMatches { post_id: post.id })
            .await;
        if let Err(e) = &matching {
            warn!(post_id = %post.id, error = %e, "Matching failed for new post");
        }

        Ok(PublishedPost {
            post,
            seat,
            matching,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetPostSummary {
    pub post_id: Uuid,
}

/// A post with its per-status match counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSummary {
    pub post: TravelPost,
    pub counts: MatchCounts,
}

impl Processor<GetPostSummary> for PostPublisher {
    type Output = PostSummary;
    type Error = MatchingError;
    async fn process(&self, query: GetPostSummary) -> Result<PostSummary, MatchingError> {
        let post = self
            .store
            .get_post(query.post_id)
            .await?
            .ok_or(MatchingError::NotFound(Missing::Post(query.post_id)))?;
        let counts = self.store.match_counts(post.id).await?;
        Ok(PostSummary { post, counts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{GenderPreference, MatchStatus, PostStatus};
    use crate::store::MemoryStore;
    use crate::testing::{RecordingNotifier, traveler_in_paris};
    use rust_decimal::dec;
    use tripmatch_sdk::objects::NotificationKind;

    fn command(creator_id: Uuid) -> PublishTravelPost {
        PublishTravelPost {
            creator_id,
            destination: "  Paris ".to_string(),
            start_date: time::macros::date!(2026 - 06 - 01),
            end_date: time::macros::date!(2026 - 06 - 10),
            description: Some("museums and food".to_string()),
            budget: dec!(1500),
            travel_style: Some("culture".to_string()),
            requirements: Some(Requirements {
                min_age: 25,
                max_age: 40,
                gender_preference: GenderPreference::Any,
            }),
        }
    }

    fn publisher(store: &MemoryStore) -> (PostPublisher, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        (
            PostPublisher::new(Arc::new(store.clone()), notifier.clone()),
            notifier,
        )
    }

    #[tokio::test]
    async fn test_publish_creates_seat_and_runs_matching() {
        let store = MemoryStore::new();
        let alice = traveler_in_paris(30);
        store.put_traveler(alice.clone()).await;
        let (publisher, notifier) = publisher(&store);
        let creator = Uuid::new_v4();

        let published = publisher.process(command(creator)).await.unwrap();
        assert_eq!(published.post.destination, "Paris");
        assert_eq!(published.post.status, PostStatus::Active);
        assert_eq!(published.seat.user_id, creator);
        assert_eq!(published.seat.status, MatchStatus::Accepted);

        let outcome = published.matching.unwrap();
        assert_eq!(outcome.created.len(), 1);
        assert_eq!(outcome.created[0].user_id, alice.id);

        let kinds: Vec<_> = notifier
            .recorded()
            .iter()
            .map(|n| (n.user_id, n.kind))
            .collect();
        let expected = vec![
            (creator, NotificationKind::NewPost),
            (alice.id, NotificationKind::NewMatch),
        ];
        assert_eq!(kinds, expected);

        let summary = publisher
            .process(GetPostSummary {
                post_id: published.post.id,
            })
            .await
            .unwrap();
        assert_eq!(summary.counts.accepted, 1);
        assert_eq!(summary.counts.pending, 1);
        assert_eq!(summary.counts.rejected, 0);
    }

    #[tokio::test]
    async fn test_matching_failure_keeps_post() {
        let store = MemoryStore::new();
        let alice = traveler_in_paris(30);
        store.put_traveler(alice.clone()).await;
        store.fail_match_inserts_for(alice.id).await;
        let (publisher, _) = publisher(&store);

        let published = publisher.process(command(Uuid::new_v4())).await.unwrap();
        assert!(matches!(
            published.matching,
            Err(MatchingError::MatchingFailed { created: 0, .. })
        ));
        assert!(store.get_post(published.post.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_invalid_posts_are_rejected() {
        let store = MemoryStore::new();
        let (publisher, notifier) = publisher(&store);
        let creator = Uuid::new_v4();

        let mut reversed = command(creator);
        reversed.end_date = time::macros::date!(2026 - 05 - 01);
        let mut ages = command(creator);
        ages.requirements = Some(Requirements {
            min_age: 50,
            max_age: 20,
            gender_preference: GenderPreference::Any,
        });
        let mut blank = command(creator);
        blank.destination = "   ".to_string();
        let mut negative = command(creator);
        negative.budget = dec!(-1);

        for cmd in [reversed, ages, blank, negative] {
            let err = publisher.process(cmd).await.unwrap_err();
            assert!(matches!(err, MatchingError::InvalidOperation(_)));
        }
        assert!(notifier.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_summary_of_missing_post_is_not_found() {
        let store = MemoryStore::new();
        let (publisher, _) = publisher(&store);
        let err = publisher
            .process(GetPostSummary {
                post_id: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MatchingError::NotFound(Missing::Post(_))));
    }
}
