use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub id: Uuid,
    pub post_id: Uuid,
    /// Distinct user ids, at least two.
    pub participants: Vec<Uuid>,
    /// Ordered by position. Empty when the trip is created.
    pub itinerary: Vec<ItineraryEntry>,
    pub created_at: time::PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ItineraryEntry {
    pub activity: String,
    pub date: time::Date,
}

impl Trip {
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }
}

/// Deduplicate participant ids, keeping first-seen order.
pub fn distinct_participants(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut out: Vec<Uuid> = Vec::new();
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[derive(Debug, sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    post_id: Uuid,
    participants: Vec<Uuid>,
    created_at: time::PrimitiveDateTime,
}

#[derive(Debug, Clone)]
pub struct GetTripById {
    pub trip_id: Uuid,
}

impl Processor<GetTripById> for DatabaseProcessor {
    type Output = Option<Trip>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetTripById")]
    async fn process(&self, query: GetTripById) -> Result<Option<Trip>, sqlx::Error> {
        let Some(row) = sqlx::query_as::<_, TripRow>(
            r#"
            SELECT id, post_id, participants, created_at
            FROM trips
            WHERE id = $1
            "#,
        )
        .bind(query.trip_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let itinerary = sqlx::query_as::<_, ItineraryEntry>(
            r#"
            SELECT activity, date
            FROM trip_itinerary
            WHERE trip_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Trip {
            id: row.id,
            post_id: row.post_id,
            participants: row.participants,
            itinerary,
            created_at: row.created_at,
        }))
    }
}

impl Trip {
    /// Insert a trip with an empty itinerary.
    ///
    /// `trips.post_id` is unique, so a second trip for the same post fails
    /// even if the caller's guards were bypassed.
    pub async fn insert_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        post_id: Uuid,
        participants: &[Uuid],
    ) -> Result<Trip, sqlx::Error> {
        let row = sqlx::query_as::<_, TripRow>(
            r#"
            INSERT INTO trips (id, post_id, participants)
            VALUES ($1, $2, $3)
            RETURNING id, post_id, participants, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(post_id)
        .bind(participants)
        .fetch_one(&mut **tx)
        .await?;
        Ok(Trip {
            id: row.id,
            post_id: row.post_id,
            participants: row.participants,
            itinerary: Vec::new(),
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_participants() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(distinct_participants([a, b, a]), vec![a, b]);
        assert_eq!(distinct_participants([a, a]), vec![a]);
    }
}
