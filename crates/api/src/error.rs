//! HTTP rendering of application errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;

use armas_core::auth::PasswordError;
use armas_core::storage::StorageError;
use armas_core::workflow::WorkflowError;
use armas_shared::AppError;

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An `AppError` on its way out as an HTTP response.
///
/// Renders `{"error": <code>, "message": <text>}`. Server errors are logged
/// and answered with a generic message.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// Shorthand for a 403 with the given reason.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self(AppError::Forbidden(message.into()))
    }

    /// Shorthand for a 400 with the given reason.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }

    /// Shorthand for a 401 with the given reason.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self(AppError::Unauthorized(message.into()))
    }

    /// HTTP status of the wrapped error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.0.is_server_error() {
            error!(error = %self.0, code = self.0.error_code(), "request failed");
            "An internal error occurred".to_string()
        } else {
            match &self.0 {
                AppError::Unauthorized(m)
                | AppError::Forbidden(m)
                | AppError::NotFound(m)
                | AppError::Validation(m)
                | AppError::Conflict(m)
                | AppError::Database(m)
                | AppError::Internal(m) => m.clone(),
            }
        };

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        Self(err.into())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self(err.into())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        Self(err.into())
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self(AppError::Database(err.to_string()))
    }
}
