//! Backend configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `BACKEND_URL` - Base URL of the hosted REST backend (e.g. `https://xyz.example.co`)
//! - `BACKEND_ANON_KEY` - API key sent with every request
//! - `BACKEND_TIMEOUT_SECS` - Per-request timeout (default: 15)
//!
//! When either the URL or the key is missing the backend is left
//! unconfigured: the binaries still start, and every remote call fails.

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum BackendConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Connection settings for the hosted backend.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL, `None` when not configured.
    pub url: Option<Url>,
    /// API key, `None` when not configured.
    pub anon_key: Option<SecretString>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url.as_ref().map(Url::as_str))
            .field(
                "anon_key",
                &self.anon_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl BackendConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `BackendConfigError` if a variable is present but malformed.
    /// Missing variables are not an error.
    pub fn from_env() -> Result<Self, BackendConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let url = get_optional_env("BACKEND_URL")
            .map(|raw| {
                Url::parse(&raw).map_err(|e| {
                    BackendConfigError::InvalidEnvVar("BACKEND_URL".to_string(), e.to_string())
                })
            })
            .transpose()?;
        let anon_key = get_optional_env("BACKEND_ANON_KEY").map(SecretString::from);
        let timeout = get_optional_env("BACKEND_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>().map_err(|e| {
                    BackendConfigError::InvalidEnvVar(
                        "BACKEND_TIMEOUT_SECS".to_string(),
                        e.to_string(),
                    )
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            url,
            anon_key,
            timeout: Duration::from_secs(timeout),
        })
    }

    /// Build a configuration pointing at `url` with `anon_key`.
    #[must_use]
    pub fn new(url: Url, anon_key: impl Into<String>) -> Self {
        Self {
            url: Some(url),
            anon_key: Some(SecretString::from(anon_key.into())),
            ..Self::default()
        }
    }

    /// Whether both the URL and the key are present.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.url.is_some() && self.anon_key.is_some()
    }
}

/// Get an optional, non-empty environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
