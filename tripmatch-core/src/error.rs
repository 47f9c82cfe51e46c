//! Error types shared by the storage seam and the matching processors.

use thiserror::Error;
use uuid::Uuid;

/// Errors from a [`MatchStore`](crate::store::MatchStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// A uniqueness constraint rejected the write, e.g. a second match for
    /// the same `(user_id, post_id)`.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Store-specific failure that is not a database error (including
    /// injected faults in the in-memory store).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        let unique = e
            .as_database_error()
            .filter(|db| db.is_unique_violation())
            .map(|db| db.message().to_string());
        match unique {
            Some(message) => StoreError::UniqueViolation(message),
            None => StoreError::Database(e),
        }
    }
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation(_))
    }
}

/// What a referenced id failed to resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Post(Uuid),
    Match(Uuid),
    Trip(Uuid),
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Missing::Post(id) => write!(f, "post {id}"),
            Missing::Match(id) => write!(f, "match {id}"),
            Missing::Trip(id) => write!(f, "trip {id}"),
        }
    }
}

/// Errors of the matching and match-lifecycle operations.
#[derive(Debug, Error)]
pub enum MatchingError {
    #[error("{0} not found")]
    NotFound(Missing),

    /// Duplicate match request, or the match was already answered.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Self-matching, malformed identifiers or input, unknown responses.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Trip promotion was aborted and its writes rolled back.
    #[error("trip promotion failed: {0}")]
    TransactionFailure(#[source] StoreError),

    /// The match finder hit a storage error. Matches created before the
    /// failure are kept.
    #[error("matching failed after creating {created} matches: {source}")]
    MatchingFailed {
        created: usize,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl MatchingError {
    pub fn invalid(message: impl Into<String>) -> Self {
        MatchingError::InvalidOperation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        MatchingError::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        MatchingError::Conflict(message.into())
    }
}
