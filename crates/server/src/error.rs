//! API error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::{DatabaseError, ValidationError};
use thiserror::Error;

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Database error.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Malformed or rejected input.
    #[error("{0}")]
    BadRequest(String),

    /// Missing, unknown or expired session.
    #[error("authentication required")]
    Unauthorized,

    /// Signed in, but not allowed to do this.
    #[error("{0}")]
    Forbidden(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Database(err) => match err {
                DatabaseError::NotFound { .. } => StatusCode::NOT_FOUND,
                DatabaseError::AlreadyExists { .. } | DatabaseError::InvalidTransition { .. } => {
                    StatusCode::CONFLICT
                }
                DatabaseError::Validation(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Database(DatabaseError::Validation(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found = ApiError::from(DatabaseError::NotFound {
            entity: "FarmActivity",
            id: "x".to_string(),
        });
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let transition = ApiError::from(DatabaseError::InvalidTransition {
            entity: "AccessRequest",
            id: "x".to_string(),
            current: "rejected".to_string(),
            expected: "pending",
        });
        assert_eq!(transition.status(), StatusCode::CONFLICT);

        let invalid = ApiError::from(DatabaseError::Validation(ValidationError::Empty(
            "name".to_string(),
        )));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("no").status(), StatusCode::FORBIDDEN);
    }
}
