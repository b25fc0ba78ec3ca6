//! Unified error handling for admin.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kaay_data::{BackendError, DataError};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::store::AdminError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// A store operation failed.
    #[error(transparent)]
    Admin(#[from] AdminError),

    /// Login failed.
    #[error("Unauthorized: {0}")]
    Auth(#[from] AuthError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Admin(AdminError::Invalid(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Admin(AdminError::Data(err)) => match err {
                DataError::NotFound(_) => StatusCode::NOT_FOUND,
                DataError::TotalMismatch { .. } => StatusCode::BAD_REQUEST,
                DataError::Backend(BackendError::Unconfigured) => StatusCode::SERVICE_UNAVAILABLE,
                DataError::Backend(_) => StatusCode::BAD_GATEWAY,
                DataError::Decode { .. } | DataError::Encode(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(AuthError::InvalidCredentials) | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Auth(AuthError::PasswordHash) | Self::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Admin(AdminError::Invalid(fields)) => {
                json!({ "error": "Validation failed", "fields": fields })
            }
            Self::Admin(AdminError::Data(DataError::NotFound(what))) => {
                json!({ "error": format!("Not found: {what}") })
            }
            _ if status == StatusCode::SERVICE_UNAVAILABLE => {
                json!({ "error": "Backend is not configured" })
            }
            _ if status == StatusCode::BAD_GATEWAY => {
                json!({ "error": "External service error" })
            }
            _ if status.is_server_error() => json!({ "error": "Internal server error" }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from the logged-in admin.
pub fn set_sentry_user(email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
