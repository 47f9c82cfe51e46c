//! Read-only projection of user accounts used for matching.
//!
//! The `travelers` table is owned by the account subsystem; nothing in this
//! crate writes to it.

use crate::entities::Gender;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traveler {
    pub id: Uuid,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    /// `None` when the user never filled in their preferences.
    pub travel_preferences: Option<TravelPreferences>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelPreferences {
    pub destinations: Vec<String>,
    pub budget_range: Option<BudgetRange>,
    pub travel_styles: Vec<String>,
}

/// Inclusive budget range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl BudgetRange {
    pub fn contains(&self, budget: Decimal) -> bool {
        self.min <= budget && budget <= self.max
    }
}

impl Traveler {
    pub fn prefers_destination(&self, destination: &str) -> bool {
        self.travel_preferences
            .as_ref()
            .is_some_and(|p| p.destinations.iter().any(|d| d == destination))
    }

    pub fn can_afford(&self, budget: Decimal) -> bool {
        self.travel_preferences
            .as_ref()
            .and_then(|p| p.budget_range)
            .is_some_and(|r| r.contains(budget))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TravelerRow {
    id: Uuid,
    age: Option<i32>,
    gender: Option<Gender>,
    preferred_destinations: Option<Vec<String>>,
    budget_min: Option<Decimal>,
    budget_max: Option<Decimal>,
    travel_styles: Vec<String>,
}

impl From<TravelerRow> for Traveler {
    fn from(row: TravelerRow) -> Self {
        let budget_range = match (row.budget_min, row.budget_max) {
            (Some(min), Some(max)) => Some(BudgetRange { min, max }),
            _ => None,
        };
        let travel_preferences = row.preferred_destinations.map(|destinations| TravelPreferences {
            destinations,
            budget_range,
            travel_styles: row.travel_styles,
        });
        Traveler {
            id: row.id,
            age: row.age,
            gender: row.gender,
            travel_preferences,
        }
    }
}

/// Filter criteria a candidate must satisfy to be considered for a post.
///
/// The same predicate exists twice: as SQL in [`FindCandidateTravelers`] and
/// as [`CandidateFilter::admits`] for in-process stores. Keep them in sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFilter {
    pub destination: String,
    pub budget: Decimal,
    pub min_age: i32,
    pub max_age: i32,
    /// `None` when the post accepts any gender.
    pub gender: Option<Gender>,
    /// The post creator is never a candidate for their own post.
    pub exclude_user: Uuid,
}

impl CandidateFilter {
    pub fn admits(&self, traveler: &Traveler) -> bool {
        if traveler.id == self.exclude_user {
            return false;
        }
        if !traveler.prefers_destination(&self.destination) || !traveler.can_afford(self.budget) {
            return false;
        }
        let age_ok = traveler
            .age
            .is_some_and(|age| self.min_age <= age && age <= self.max_age);
        let gender_ok = match self.gender {
            None => true,
            Some(required) => traveler.gender == Some(required),
        };
        age_ok && gender_ok
    }
}

#[derive(Debug, Clone)]
pub struct GetTravelerById {
    pub user_id: Uuid,
}

impl Processor<GetTravelerById> for DatabaseProcessor {
    type Output = Option<Traveler>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetTravelerById")]
    async fn process(&self, query: GetTravelerById) -> Result<Option<Traveler>, sqlx::Error> {
        let row = sqlx::query_as::<_, TravelerRow>(
            r#"
            SELECT id, age, gender, preferred_destinations, budget_min, budget_max, travel_styles
            FROM travelers
            WHERE id = $1
            "#,
        )
        .bind(query.user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Traveler::from))
    }
}

#[derive(Debug, Clone)]
/// Find every traveler admitted by a [`CandidateFilter`].
pub struct FindCandidateTravelers {
    pub filter: CandidateFilter,
}

impl Processor<FindCandidateTravelers> for DatabaseProcessor {
    type Output = Vec<Traveler>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:FindCandidateTravelers")]
    async fn process(&self, query: FindCandidateTravelers) -> Result<Vec<Traveler>, sqlx::Error> {
        let CandidateFilter {
            destination,
            budget,
            min_age,
            max_age,
            gender,
            exclude_user,
        } = query.filter;
        let rows = sqlx::query_as::<_, TravelerRow>(
            r#"
            SELECT id, age, gender, preferred_destinations, budget_min, budget_max, travel_styles
            FROM travelers
            WHERE $1 = ANY(preferred_destinations)
              AND budget_min <= $2
              AND budget_max >= $2
              AND age BETWEEN $3 AND $4
              AND ($5::gender IS NULL OR gender = $5)
              AND id <> $6
            "#,
        )
        .bind(destination)
        .bind(budget)
        .bind(min_age)
        .bind(max_age)
        .bind(gender)
        .bind(exclude_user)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Traveler::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn alice() -> Traveler {
        Traveler {
            id: Uuid::new_v4(),
            age: Some(30),
            gender: Some(Gender::Female),
            travel_preferences: Some(TravelPreferences {
                destinations: vec!["Paris".to_string()],
                budget_range: Some(BudgetRange {
                    min: dec!(1000),
                    max: dec!(2000),
                }),
                travel_styles: vec![],
            }),
        }
    }

    fn paris_filter() -> CandidateFilter {
        CandidateFilter {
            destination: "Paris".to_string(),
            budget: dec!(1500),
            min_age: 25,
            max_age: 40,
            gender: None,
            exclude_user: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_filter_admits_matching_traveler() {
        assert!(paris_filter().admits(&alice()));
    }

    #[test]
    fn test_filter_budget_bounds_are_inclusive() {
        let mut filter = paris_filter();
        filter.budget = dec!(2000);
        assert!(filter.admits(&alice()));
        filter.budget = dec!(2000.01);
        assert!(!filter.admits(&alice()));
    }

    #[test]
    fn test_filter_rejects_excluded_and_mismatched() {
        let traveler = alice();
        let mut filter = paris_filter();
        filter.exclude_user = traveler.id;
        assert!(!filter.admits(&traveler));

        let mut filter = paris_filter();
        filter.gender = Some(Gender::Male);
        assert!(!filter.admits(&traveler));

        let mut filter = paris_filter();
        filter.destination = "Tokyo".to_string();
        assert!(!filter.admits(&traveler));

        let mut no_age = alice();
        no_age.age = None;
        assert!(!paris_filter().admits(&no_age));
    }
}
