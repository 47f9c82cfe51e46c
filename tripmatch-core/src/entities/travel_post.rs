use crate::entities::{GenderPreference, PostStatus};
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelPost {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub destination: String,
    pub start_date: time::Date,
    pub end_date: time::Date,
    pub description: Option<String>,
    pub budget: Decimal,
    pub travel_style: Option<String>,
    pub requirements: Option<Requirements>,
    pub status: PostStatus,
    pub created_at: time::PrimitiveDateTime,
}

/// Companion requirements. `min_age <= max_age` is checked on publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirements {
    pub min_age: i32,
    pub max_age: i32,
    pub gender_preference: GenderPreference,
}

impl TravelPost {
    pub fn is_active(&self) -> bool {
        self.status == PostStatus::Active
    }
}

/// Data for inserting a new post.
#[derive(Debug, Clone)]
pub struct TravelPostInsert {
    pub creator_id: Uuid,
    pub destination: String,
    pub start_date: time::Date,
    pub end_date: time::Date,
    pub description: Option<String>,
    pub budget: Decimal,
    pub travel_style: Option<String>,
    pub requirements: Option<Requirements>,
}

#[derive(Debug, sqlx::FromRow)]
struct TravelPostRow {
    id: Uuid,
    creator_id: Uuid,
    destination: String,
    start_date: time::Date,
    end_date: time::Date,
    description: Option<String>,
    budget: Decimal,
    travel_style: Option<String>,
    min_age: Option<i32>,
    max_age: Option<i32>,
    gender_preference: Option<GenderPreference>,
    status: PostStatus,
    created_at: time::PrimitiveDateTime,
}

impl From<TravelPostRow> for TravelPost {
    fn from(row: TravelPostRow) -> Self {
        // the three requirement columns are all set or all null (table CHECK)
        let requirements = match (row.min_age, row.max_age, row.gender_preference) {
            (Some(min_age), Some(max_age), Some(gender_preference)) => Some(Requirements {
                min_age,
                max_age,
                gender_preference,
            }),
            _ => None,
        };
        TravelPost {
            id: row.id,
            creator_id: row.creator_id,
            destination: row.destination,
            start_date: row.start_date,
            end_date: row.end_date,
            description: row.description,
            budget: row.budget,
            travel_style: row.travel_style,
            requirements,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

const POST_COLUMNS: &str = "id, creator_id, destination, start_date, end_date, description, \
    budget, travel_style, min_age, max_age, gender_preference, status, created_at";

#[derive(Debug, Clone)]
pub struct GetTravelPostById {
    pub post_id: Uuid,
}

impl Processor<GetTravelPostById> for DatabaseProcessor {
    type Output = Option<TravelPost>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetTravelPostById")]
    async fn process(&self, query: GetTravelPostById) -> Result<Option<TravelPost>, sqlx::Error> {
        let row = sqlx::query_as::<_, TravelPostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM travel_posts WHERE id = $1"
        ))
        .bind(query.post_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(TravelPost::from))
    }
}

impl TravelPost {
    /// Insert a new active post.
    pub async fn insert_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        post: TravelPostInsert,
    ) -> Result<TravelPost, sqlx::Error> {
        let (min_age, max_age, gender_preference) = match post.requirements {
            Some(r) => (Some(r.min_age), Some(r.max_age), Some(r.gender_preference)),
            None => (None, None, None),
        };
        let row = sqlx::query_as::<_, TravelPostRow>(&format!(
            r#"
            INSERT INTO travel_posts
                (id, creator_id, destination, start_date, end_date, description,
                 budget, travel_style, min_age, max_age, gender_preference, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'active')
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(post.creator_id)
        .bind(post.destination)
        .bind(post.start_date)
        .bind(post.end_date)
        .bind(post.description)
        .bind(post.budget)
        .bind(post.travel_style)
        .bind(min_age)
        .bind(max_age)
        .bind(gender_preference)
        .fetch_one(&mut **tx)
        .await?;
        Ok(row.into())
    }

    /// Fetch a post and hold its row lock until the transaction ends.
    ///
    /// Every trip promotion for the same post serializes on this lock.
    pub async fn get_for_update_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        post_id: Uuid,
    ) -> Result<Option<TravelPost>, sqlx::Error> {
        let row = sqlx::query_as::<_, TravelPostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM travel_posts WHERE id = $1 FOR UPDATE"
        ))
        .bind(post_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(row.map(TravelPost::from))
    }

    /// Close an active post. Returns whether a row changed.
    pub async fn close_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        post_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE travel_posts
            SET status = 'closed'
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(post_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
