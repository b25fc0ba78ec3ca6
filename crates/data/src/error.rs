//! Error types for backend access.

use kaay_core::Price;
use thiserror::Error;

/// Errors raised by a [`Backend`](crate::Backend) adapter.
#[derive(Debug, Error)]
pub enum BackendError {
    /// No backend URL/key were configured.
    #[error("backend is not configured")]
    Unconfigured,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        message: String,
    },

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend URL could not be built.
    #[error("invalid backend URL: {0}")]
    Url(#[from] url::ParseError),

    /// The requested server-side function does not exist.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// The table is unavailable (used by the in-memory backend for fault injection).
    #[error("table unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by the entity services.
#[derive(Debug, Error)]
pub enum DataError {
    /// The backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// A row could not be decoded into its entity type.
    #[error("could not decode {entity}: {source}")]
    Decode {
        /// Entity being decoded.
        entity: &'static str,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A write payload could not be encoded.
    #[error("could not encode payload: {0}")]
    Encode(serde_json::Error),

    /// The entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An order total did not match its line items.
    #[error("order total {actual} does not match line items ({expected})")]
    TotalMismatch {
        /// Total recomputed from the items.
        expected: Price,
        /// Total carried by the order.
        actual: Price,
    },
}

impl DataError {
    /// Whether this error means the backend was never configured.
    #[must_use]
    pub const fn is_unconfigured(&self) -> bool {
        matches!(self, Self::Backend(BackendError::Unconfigured))
    }
}

/// Result type alias for service calls.
pub type Result<T> = std::result::Result<T, DataError>;
