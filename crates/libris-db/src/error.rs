use libris_core::AppError;
use thiserror::Error;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// A unique constraint rejected the write. Carries the constraint name when known.
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    /// A compare-and-set lost: the row changed between read and write.
    #[error("stale record")]
    Stale,

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                StoreError::Conflict(db.constraint().unwrap_or("unknown").to_string())
            }
            _ => StoreError::Database(error),
        }
    }
}

/// Default translation. Callers that give `NotFound`, `Conflict` or `Stale` a domain
/// meaning match on them before falling back to this.
impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => AppError::not_found("Resource not found"),
            other => AppError::internal(other.to_string()),
        }
    }
}
