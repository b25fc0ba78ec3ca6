//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_EMAIL` - Login email of the back-office account
//! - `ADMIN_PASSWORD_HASH` - Argon2 PHC string for that account's password
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_DATA_DIR` - Directory for local snapshots (default: data/admin)
//! - `ADMIN_SECURE_COOKIES` - Mark the session cookie `Secure` (default: false)
//! - `BACKEND_URL`, `BACKEND_ANON_KEY`, `BACKEND_TIMEOUT_SECS` - see [`BackendConfig`]
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag (default: development)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use argon2::PasswordHash;
use kaay_data::BackendConfig;
use kaay_data::config::BackendConfigError;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Backend configuration: {0}")]
    Backend(#[from] BackendConfigError),
}

/// Admin application configuration.
#[derive(Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Where the premium request snapshot and admin session snapshot live
    pub data_dir: PathBuf,
    /// Whether the session cookie requires HTTPS
    pub secure_cookies: bool,
    /// Login email, compared case-insensitively
    pub admin_email: String,
    /// Argon2 PHC string
    pub password_hash: SecretString,
    /// Remote backend connection
    pub backend: BackendConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: String,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("data_dir", &self.data_dir)
            .field("secure_cookies", &self.secure_cookies)
            .field("admin_email", &self.admin_email)
            .field("password_hash", &"[REDACTED]")
            .field("backend", &self.backend)
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl AdminConfig {
    /// Configuration with default bind address and paths for one account.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `password_hash` is not a PHC string.
    pub fn new(admin_email: &str, password_hash: SecretString) -> Result<Self, ConfigError> {
        validate_password_hash(&password_hash, "ADMIN_PASSWORD_HASH")?;
        Ok(Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3001,
            data_dir: PathBuf::from("data/admin"),
            secure_cookies: false,
            admin_email: admin_email.trim().to_string(),
            password_hash,
            backend: BackendConfig::default(),
            sentry_dsn: None,
            sentry_environment: "development".to_string(),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or any
    /// variable is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let admin_email = get_required_env("ADMIN_EMAIL")?;
        let password_hash = get_required_secret("ADMIN_PASSWORD_HASH")?;

        Ok(Self {
            host: parse_env("ADMIN_HOST", "127.0.0.1")?,
            port: parse_env("ADMIN_PORT", "3001")?,
            data_dir: PathBuf::from(get_env_or_default("ADMIN_DATA_DIR", "data/admin")),
            secure_cookies: parse_env("ADMIN_SECURE_COOKIES", "false")?,
            backend: BackendConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_env_or_default("SENTRY_ENVIRONMENT", "development"),
            ..Self::new(&admin_email, password_hash)?
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    get_optional_env(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    get_required_env(key).map(SecretString::from)
}

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env_or_default(key, default);
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Reject anything that is not a parseable PHC string, so a plaintext
/// password pasted into the environment fails at start-up.
fn validate_password_hash(hash: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    PasswordHash::new(hash.expose_secret())
        .map(drop)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$a2FheXNhbHRrYWF5c2FsdA$3KAV0MmH0XoZdhkxXp1BFt4zBKnfcI0rFdGyEY3LJ0Y";

    #[test]
    fn test_new_defaults() {
        let config = AdminConfig::new(" admin@kaay.sn ", SecretString::from(HASH)).unwrap();
        assert_eq!(config.admin_email, "admin@kaay.sn");
        assert_eq!(config.socket_addr().port(), 3001);
        assert_eq!(config.data_dir, PathBuf::from("data/admin"));
    }

    #[test]
    fn test_plaintext_password_rejected() {
        let err = AdminConfig::new("admin@kaay.sn", SecretString::from("hunter2")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "ADMIN_PASSWORD_HASH"));
    }

    #[test]
    fn test_debug_redacts_hash() {
        let config = AdminConfig::new("admin@kaay.sn", SecretString::from(HASH)).unwrap();
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("argon2id"));
    }
}
