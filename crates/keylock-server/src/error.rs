//! Error types for the keylock server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use keylock_core::{IssueError, StoreError, ValidationError};
use serde::Serialize;

/// Application error type.
///
/// License rejections are not errors; handlers return them as verdicts.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("License binding is contended, retry later")]
    Contended,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Admin credentials required")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub error: String,
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::Store(e) => AppError::Store(e),
            ValidationError::Contention { .. } => AppError::Contended,
        }
    }
}

impl From<IssueError> for AppError {
    fn from(e: IssueError) -> Self {
        match e {
            IssueError::Store(e) => AppError::Store(e),
            IssueError::DurationOutOfRange(_) => AppError::BadRequest(e.to_string()),
            IssueError::KeysExhausted { .. } => AppError::Internal(e.to_string()),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Store(StoreError::DuplicateKey) => StatusCode::CONFLICT,
            AppError::Store(StoreError::Unavailable(_)) | AppError::Contended => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Store(StoreError::Backend(_)) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Store(e) => {
                tracing::error!("Store error: {}", e);
                if e.is_transient() {
                    "License store unavailable".to_string()
                } else {
                    "Internal server error".to_string()
                }
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Contended => {
                tracing::warn!("{}", self);
                self.to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            status: "error",
            error: message,
        };
        (status, Json(body)).into_response()
    }
}
