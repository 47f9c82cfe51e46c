//! Traveler / post compatibility scoring.

use crate::entities::travel_post::TravelPost;
use crate::entities::traveler::Traveler;

/// Candidates must score strictly above this to be matched to a post.
pub const MATCH_SCORE_THRESHOLD: u8 = 50;

const DESTINATION_WEIGHT: u8 = 30;
const BUDGET_WEIGHT: u8 = 30;
const AGE_WEIGHT: u8 = 20;
const GENDER_WEIGHT: u8 = 20;

/// Score how well `traveler` fits `post`, in `0..=100`.
///
/// Each criterion adds its weight independently:
/// destination preferred (30), post budget inside the traveler's budget
/// range (30), age inside the post's age bounds (20), gender preference
/// satisfied (20). A traveler without preferences, or a post without
/// requirements, scores 0.
pub fn score(traveler: &Traveler, post: &TravelPost) -> u8 {
    let (Some(_), Some(requirements)) = (&traveler.travel_preferences, &post.requirements) else {
        return 0;
    };

    let mut total = 0;
    if traveler.prefers_destination(&post.destination) {
        total += DESTINATION_WEIGHT;
    }
    if traveler.can_afford(post.budget) {
        total += BUDGET_WEIGHT;
    }
    if traveler
        .age
        .is_some_and(|age| requirements.min_age <= age && age <= requirements.max_age)
    {
        total += AGE_WEIGHT;
    }
    if requirements.gender_preference.accepts(traveler.gender) {
        total += GENDER_WEIGHT;
    }
    total
}

/// Whether a score clears [`MATCH_SCORE_THRESHOLD`].
pub fn above_threshold(score: u8) -> bool {
    score > MATCH_SCORE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::travel_post::Requirements;
    use crate::entities::traveler::{BudgetRange, TravelPreferences};
    use crate::entities::{Gender, GenderPreference, PostStatus};
    use crate::utils::utc_now;
    use rust_decimal::dec;
    use uuid::Uuid;

    fn post(requirements: Option<Requirements>) -> TravelPost {
        TravelPost {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            destination: "Paris".to_string(),
            start_date: time::macros::date!(2026 - 06 - 01),
            end_date: time::macros::date!(2026 - 06 - 10),
            description: None,
            budget: dec!(1500),
            travel_style: None,
            requirements,
            status: PostStatus::Active,
            created_at: utc_now(),
        }
    }

    fn requirements(gender_preference: GenderPreference) -> Option<Requirements> {
        Some(Requirements {
            min_age: 25,
            max_age: 40,
            gender_preference,
        })
    }

    fn traveler(
        age: i32,
        gender: Option<Gender>,
        destinations: &[&str],
        budget: Option<(i64, i64)>,
    ) -> Traveler {
        Traveler {
            id: Uuid::new_v4(),
            age: Some(age),
            gender,
            travel_preferences: Some(TravelPreferences {
                destinations: destinations.iter().map(|d| d.to_string()).collect(),
                budget_range: budget.map(|(min, max)| BudgetRange {
                    min: min.into(),
                    max: max.into(),
                }),
                travel_styles: vec![],
            }),
        }
    }

    #[test]
    fn test_full_match_scores_100() {
        let alice = traveler(30, Some(Gender::Female), &["Paris"], Some((1000, 2000)));
        let s = score(&alice, &post(requirements(GenderPreference::Any)));
        assert_eq!(s, 100);
        assert!(above_threshold(s));
    }

    #[test]
    fn test_criteria_are_independent() {
        // only the gender wildcard applies
        let bob = traveler(50, Some(Gender::Male), &["Tokyo"], Some((100, 200)));
        assert_eq!(score(&bob, &post(requirements(GenderPreference::Any))), 20);

        // destination and age, gender preference not met
        let carol = traveler(30, Some(Gender::Male), &["Paris"], None);
        let female_only = post(requirements(GenderPreference::Female));
        assert_eq!(score(&carol, &female_only), 50);
        assert!(!above_threshold(50));
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let female_only = post(requirements(GenderPreference::Female));
        let edge = traveler(40, Some(Gender::Female), &["Paris"], Some((1500, 1500)));
        assert_eq!(score(&edge, &female_only), 100);

        let too_old = traveler(41, Some(Gender::Female), &["Paris"], Some((1500, 1500)));
        assert_eq!(score(&too_old, &female_only), 80);
    }

    #[test]
    fn test_missing_data_scores_zero() {
        let alice = traveler(30, Some(Gender::Female), &["Paris"], Some((1000, 2000)));
        assert_eq!(score(&alice, &post(None)), 0);

        let no_prefs = Traveler {
            travel_preferences: None,
            ..alice
        };
        let anyone = post(requirements(GenderPreference::Any));
        assert_eq!(score(&no_prefs, &anyone), 0);
    }

    #[test]
    fn test_score_is_deterministic() {
        let alice = traveler(30, None, &["Paris", "Rome"], Some((1000, 2000)));
        let p = post(requirements(GenderPreference::Male));
        let first = score(&alice, &p);
        assert_eq!(first, 80);
        assert_eq!(score(&alice, &p), first);
    }
}
