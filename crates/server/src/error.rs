//! Application error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::query::QueryError;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("not found")]
    NotFound,

    #[error("invalid identifier format")]
    InvalidIdentifier,

    #[error("validation failed")]
    Validation(Vec<String>),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidIdentifier
            | AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::Query(_) => StatusCode::BAD_REQUEST,
        };

        // In development, include error details; in production, be vague
        let body = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal server error");
                json!({ "error": "internal server error" })
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                json!({ "error": "internal server error" })
            }
            AppError::Validation(details) => {
                json!({ "error": "Validation failed", "details": details })
            }
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            AppError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InvalidIdentifier.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Validation(vec!["Name is required".to_string()])
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Query(QueryError::InvalidPagination("page".to_string()))
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }
}
