use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{
    auth::{jwt::JwtError, password::PasswordError},
    tasks::policy::AccessDenied,
};

pub type AppResult<T> = Result<T, AppError>;

/// Error returned by every handler; rendered as `{"error", "message"}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    Validation(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match self {
            AppError::Validation(msg) => ("bad_request", msg),
            AppError::Unauthorized(msg) => ("unauthorized", msg),
            AppError::Forbidden(msg) => ("forbidden", msg),
            AppError::NotFound(msg) => ("not_found", msg),
            AppError::Conflict(msg) => ("conflict", msg),
            AppError::Internal(e) => {
                // detail stays in the log
                error!(error = %e, "internal error");
                ("internal_error", "An unexpected error occurred.".to_string())
            }
        };
        let body = Json(ErrorBody {
            error: code.to_string(),
            message,
        });
        (status, body).into_response()
    }
}

/// Failure reported by a `UserStore` / `TaskStore` implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Optimistic-concurrency check failed: the row changed since it was read.
    #[error("row was modified concurrently")]
    Conflict,
    /// A unique index rejected the write.
    #[error("duplicate value for {0}")]
    Duplicate(String),
    #[error("row not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => AppError::Conflict(
                "Task was modified concurrently; re-fetch and retry.".into(),
            ),
            StoreError::Duplicate(field) if field.contains("email") => {
                AppError::Conflict("Email already registered.".into())
            }
            StoreError::Duplicate(field) if field.contains("name") => {
                AppError::Conflict("Name already taken.".into())
            }
            StoreError::Duplicate(field) => {
                AppError::Conflict(format!("Duplicate value for {field}."))
            }
            StoreError::NotFound => AppError::NotFound("Resource not found.".into()),
            StoreError::Database(e) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AppError::Unauthorized("Token expired".into()),
            JwtError::Signing(e) => AppError::Internal(anyhow::Error::new(e)),
            _ => AppError::Unauthorized("Invalid or expired token".into()),
        }
    }
}

impl From<AccessDenied> for AppError {
    fn from(err: AccessDenied) -> Self {
        AppError::Forbidden(err.to_string())
    }
}

// Extractor rejections are client input errors; they share the JSON body shape.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}
