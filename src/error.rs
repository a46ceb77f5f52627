use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// StoreError
///
/// Failures surfaced by the persistence layer. Unique-constraint violations get their own
/// variant, decided from the driver's error kind.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    UniqueViolation(#[source] sqlx::Error),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let unique = matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation());
        if unique {
            StoreError::UniqueViolation(err)
        } else {
            StoreError::Database(err)
        }
    }
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation(_))
    }
}

/// ApiError
///
/// The HTTP-facing error taxonomy. Every variant renders as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid input. Nothing was written.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// The (recipe, ingredient) pair, or a user's name/email, already exists.
    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::AlreadyExists(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Store(err) => {
                tracing::error!(error = ?err, "store failure");
                "Internal server error".to_string()
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
