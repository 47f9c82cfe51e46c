use crate::entities::MatchStatus;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use uuid::Uuid;

/// One user's candidacy for one post. `(user_id, post_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct MatchRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    /// Compatibility score in `0..=100`.
    pub match_score: i16,
    pub status: MatchStatus,
    pub created_at: time::PrimitiveDateTime,
}

/// Data for inserting a new match.
#[derive(Debug, Clone, Copy)]
pub struct MatchInsert {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub match_score: i16,
    pub status: MatchStatus,
}

/// Per-status match counts for one post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchCounts {
    pub pending: u32,
    pub accepted: u32,
    pub rejected: u32,
}

impl MatchCounts {
    pub fn add(&mut self, status: MatchStatus, n: u32) {
        match status {
            MatchStatus::Pending => self.pending += n,
            MatchStatus::Accepted => self.accepted += n,
            MatchStatus::Rejected => self.rejected += n,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GetMatchById {
    pub match_id: Uuid,
}

impl Processor<GetMatchById> for DatabaseProcessor {
    type Output = Option<MatchRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetMatchById")]
    async fn process(&self, query: GetMatchById) -> Result<Option<MatchRecord>, sqlx::Error> {
        sqlx::query_as::<_, MatchRecord>(
            r#"
            SELECT id, user_id, post_id, match_score, status, created_at
            FROM matches
            WHERE id = $1
            "#,
        )
        .bind(query.match_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct GetMatchForPostAndUser {
    pub post_id: Uuid,
    pub user_id: Uuid,
}

impl Processor<GetMatchForPostAndUser> for DatabaseProcessor {
    type Output = Option<MatchRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetMatchForPostAndUser")]
    async fn process(
        &self,
        query: GetMatchForPostAndUser,
    ) -> Result<Option<MatchRecord>, sqlx::Error> {
        sqlx::query_as::<_, MatchRecord>(
            r#"
            SELECT id, user_id, post_id, match_score, status, created_at
            FROM matches
            WHERE post_id = $1 AND user_id = $2
            "#,
        )
        .bind(query.post_id)
        .bind(query.user_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Insert a match. A second insert for the same `(user_id, post_id)` fails
/// with a unique violation; it never overwrites.
pub struct InsertMatch {
    pub insert: MatchInsert,
}

impl Processor<InsertMatch> for DatabaseProcessor {
    type Output = MatchRecord;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertMatch")]
    async fn process(&self, cmd: InsertMatch) -> Result<MatchRecord, sqlx::Error> {
        let MatchInsert {
            user_id,
            post_id,
            match_score,
            status,
        } = cmd.insert;
        sqlx::query_as::<_, MatchRecord>(
            r#"
            INSERT INTO matches (id, user_id, post_id, match_score, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, post_id, match_score, status, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(post_id)
        .bind(match_score)
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Move a pending match to a terminal status.
///
/// Returns `None` when the match does not exist or is no longer pending,
/// so two concurrent responses cannot both win.
pub struct ResolvePendingMatch {
    pub match_id: Uuid,
    pub status: MatchStatus,
}

impl Processor<ResolvePendingMatch> for DatabaseProcessor {
    type Output = Option<MatchRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ResolvePendingMatch")]
    async fn process(&self, cmd: ResolvePendingMatch) -> Result<Option<MatchRecord>, sqlx::Error> {
        sqlx::query_as::<_, MatchRecord>(
            r#"
            UPDATE matches
            SET status = $2
            WHERE id = $1 AND status = 'pending'
            RETURNING id, user_id, post_id, match_score, status, created_at
            "#,
        )
        .bind(cmd.match_id)
        .bind(cmd.status)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct ListMatchesForPost {
    pub post_id: Uuid,
    pub status: Option<MatchStatus>,
}

impl Processor<ListMatchesForPost> for DatabaseProcessor {
    type Output = Vec<MatchRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListMatchesForPost")]
    async fn process(&self, query: ListMatchesForPost) -> Result<Vec<MatchRecord>, sqlx::Error> {
        sqlx::query_as::<_, MatchRecord>(
            r#"
            SELECT id, user_id, post_id, match_score, status, created_at
            FROM matches
            WHERE post_id = $1
              AND ($2::match_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(query.post_id)
        .bind(query.status)
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Every match of a user, newest first.
pub struct ListMatchesForUser {
    pub user_id: Uuid,
}

impl Processor<ListMatchesForUser> for DatabaseProcessor {
    type Output = Vec<MatchRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListMatchesForUser")]
    async fn process(&self, query: ListMatchesForUser) -> Result<Vec<MatchRecord>, sqlx::Error> {
        sqlx::query_as::<_, MatchRecord>(
            r#"
            SELECT id, user_id, post_id, match_score, status, created_at
            FROM matches
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(query.user_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct CountMatchesByStatus {
    pub post_id: Uuid,
}

impl Processor<CountMatchesByStatus> for DatabaseProcessor {
    type Output = MatchCounts;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:CountMatchesByStatus")]
    async fn process(&self, query: CountMatchesByStatus) -> Result<MatchCounts, sqlx::Error> {
        let rows: Vec<(MatchStatus, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*)
            FROM matches
            WHERE post_id = $1
            GROUP BY status
            "#,
        )
        .bind(query.post_id)
        .fetch_all(&self.pool)
        .await?;
        let mut counts = MatchCounts::default();
        for (status, n) in rows {
            counts.add(status, u32::try_from(n).unwrap_or(u32::MAX));
        }
        Ok(counts)
    }
}

/// Accepted matches of non-creators on posts that are still active.
///
/// These are acceptances whose trip promotion has not happened yet, either
/// because it failed or because the counterpart has not accepted.
#[derive(Debug, Clone)]
pub struct FindUnpromotedAcceptances {
    pub limit: i64,
    pub offset: i64,
}

impl Processor<FindUnpromotedAcceptances> for DatabaseProcessor {
    type Output = Vec<MatchRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:FindUnpromotedAcceptances")]
    async fn process(
        &self,
        query: FindUnpromotedAcceptances,
    ) -> Result<Vec<MatchRecord>, sqlx::Error> {
        sqlx::query_as::<_, MatchRecord>(
            r#"
            SELECT m.id, m.user_id, m.post_id, m.match_score, m.status, m.created_at
            FROM matches m
            JOIN travel_posts p ON p.id = m.post_id
            WHERE m.status = 'accepted'
              AND p.status = 'active'
              AND m.user_id <> p.creator_id
            ORDER BY m.created_at ASC, m.id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await
    }
}

impl MatchRecord {
    pub async fn insert_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        insert: MatchInsert,
    ) -> Result<MatchRecord, sqlx::Error> {
        sqlx::query_as::<_, MatchRecord>(
            r#"
            INSERT INTO matches (id, user_id, post_id, match_score, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, post_id, match_score, status, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(insert.user_id)
        .bind(insert.post_id)
        .bind(insert.match_score)
        .bind(insert.status)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn get_by_id_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        match_id: Uuid,
    ) -> Result<Option<MatchRecord>, sqlx::Error> {
        sqlx::query_as::<_, MatchRecord>(
            r#"
            SELECT id, user_id, post_id, match_score, status, created_at
            FROM matches
            WHERE id = $1
            "#,
        )
        .bind(match_id)
        .fetch_optional(&mut **tx)
        .await
    }

    /// The accepted match `user_id` holds on `post_id`, if any.
    pub async fn find_accepted_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MatchRecord>, sqlx::Error> {
        sqlx::query_as::<_, MatchRecord>(
            r#"
            SELECT id, user_id, post_id, match_score, status, created_at
            FROM matches
            WHERE post_id = $1 AND user_id = $2 AND status = 'accepted'
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await
    }
}
