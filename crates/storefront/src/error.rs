//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kaay_core::validation::FieldErrors;
use kaay_data::{BackendError, DataError};
use serde_json::json;
use thiserror::Error;

use crate::store::PaymentError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend operation failed.
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Submitted fields failed validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] FieldErrors),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Data(err) => data_status(err),
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Validation(fields) => json!({ "error": "Validation failed", "fields": fields }),
            Self::Data(DataError::NotFound(what)) => json!({ "error": format!("Not found: {what}") }),
            Self::Data(DataError::TotalMismatch { .. }) => json!({ "error": self.to_string() }),
            Self::Data(err) if err.is_unconfigured() => {
                json!({ "error": "Service temporarily unavailable" })
            }
            Self::Data(DataError::Backend(_)) => json!({ "error": "External service error" }),
            Self::Data(_) | Self::Session(_) | Self::Internal(_) => {
                json!({ "error": "Internal server error" })
            }
            Self::NotFound(_) | Self::BadRequest(_) => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// HTTP status for a service error.
#[must_use]
pub fn data_status(err: &DataError) -> StatusCode {
    match err {
        DataError::NotFound(_) => StatusCode::NOT_FOUND,
        DataError::TotalMismatch { .. } => StatusCode::BAD_REQUEST,
        DataError::Backend(BackendError::Unconfigured) => StatusCode::SERVICE_UNAVAILABLE,
        DataError::Backend(_) => StatusCode::BAD_GATEWAY,
        DataError::Decode { .. } | DataError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// HTTP status for a failed checkout.
#[must_use]
pub fn payment_status(err: &PaymentError) -> StatusCode {
    match err {
        PaymentError::Busy => StatusCode::CONFLICT,
        PaymentError::NoMethod | PaymentError::AmountMismatch { .. } => StatusCode::BAD_REQUEST,
        PaymentError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PaymentError::Declined(_) => StatusCode::PAYMENT_REQUIRED,
        PaymentError::NotRecorded => StatusCode::BAD_GATEWAY,
        PaymentError::Data(err) => data_status(err),
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of shopper
/// actions leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kaay_core::Price;
    use kaay_core::validation::ValidationError;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Data(DataError::Backend(BackendError::Unconfigured))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(AppError::Data(DataError::NotFound("order".to_string()))),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let mut fields = FieldErrors::default();
        fields.check::<()>("phone", Err(ValidationError::Required { field: "phone" }));
        let response = AppError::Validation(fields).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["fields"]["phone"].is_string());
    }

    #[test]
    fn test_payment_status_codes() {
        assert_eq!(payment_status(&PaymentError::Busy), StatusCode::CONFLICT);
        assert_eq!(
            payment_status(&PaymentError::Declined("no".to_string())),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            payment_status(&PaymentError::AmountMismatch {
                expected: Price::new(1),
                actual: Price::new(2)
            }),
            StatusCode::BAD_REQUEST
        );
    }
}
