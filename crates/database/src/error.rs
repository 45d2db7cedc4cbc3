//! Database error types.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Record already exists
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// A status change was attempted from the wrong state.
    #[error("{entity} {id} is {current}, expected {expected}")]
    InvalidTransition {
        entity: &'static str,
        id: String,
        current: String,
        expected: &'static str,
    },

    /// Input rejected before reaching the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// JSON column could not be encoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DatabaseError {
    /// Map a unique violation to `AlreadyExists`, passing other errors through.
    pub(crate) fn from_insert(err: sqlx::Error, entity: &'static str, id: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity,
                    id: id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(err)
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
