use crate::repositories::RepositoryError;
use crate::services::{RegistryError, UserServiceError};
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

// Type alias for Result with our AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors as seen by an HTTP client.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PreconditionFailed(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication required")]
    Unauthorized,
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(e) => AppError::Database(e),
            RepositoryError::NotFound => AppError::NotFound("Record not found".to_string()),
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(_) => AppError::NotFound("Server not found".to_string()),
            RegistryError::Inactive(_) => {
                AppError::PreconditionFailed("Server is not active".to_string())
            }
            RegistryError::AlreadyClaimed(_) => {
                AppError::PreconditionFailed("Server not available for connection".to_string())
            }
            RegistryError::Repository(e) => e.into(),
        }
    }
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::InvalidEmail | UserServiceError::EmptyUserId => {
                AppError::Validation(err.to_string())
            }
            UserServiceError::UserNotFound => AppError::NotFound("User not found".to_string()),
            UserServiceError::RepositoryError(e) => e.into(),
        }
    }
}

// Extractor rejections share the JSON error body instead of axum's plain text.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::PreconditionFailed(msg) => {
                (StatusCode::BAD_REQUEST, "precondition_failed", msg)
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "invalid_request", msg),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Authentication required".to_string(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({
            "error": error_code,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_errors_map_to_http_statuses() {
        let cases = [
            (RegistryError::NotFound("s".into()), StatusCode::NOT_FOUND),
            (RegistryError::Inactive("s".into()), StatusCode::BAD_REQUEST),
            (
                RegistryError::AlreadyClaimed("s".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                RegistryError::Repository(RepositoryError::Database(sqlx::Error::PoolTimedOut)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn unauthorized_is_401() {
        assert_eq!(
            AppError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
