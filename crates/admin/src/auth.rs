//! Password login for the single back-office account.
//!
//! The account lives in configuration: `ADMIN_EMAIL` plus an Argon2 PHC
//! string in `ADMIN_PASSWORD_HASH`. A successful login stores a
//! [`CurrentAdmin`] in the session.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AdminConfig;

/// Session keys for admin authentication data.
pub mod session_keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}

/// Session-stored admin identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub email: String,
    pub logged_in_at: DateTime<Utc>,
}

/// Login failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The configured hash could not be parsed.
    #[error("password hash is malformed")]
    PasswordHash,
}

/// Login form.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Check a login attempt against the configured account.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the email does not match or the
/// password does not verify.
pub fn verify_login(
    config: &AdminConfig,
    request: &LoginRequest,
) -> Result<CurrentAdmin, AuthError> {
    // Timing must not reveal whether the email matched
    let password_ok = verify_password(
        &request.password,
        config.password_hash.expose_secret(),
    )?;
    let email_ok = request
        .email
        .trim()
        .eq_ignore_ascii_case(&config.admin_email);

    if !(password_ok && email_ok) {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(CurrentAdmin {
        email: config.admin_email.clone(),
        logged_in_at: Utc::now(),
    })
}

/// Verify a password against a PHC hash.
fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
pub(crate) mod test_support {
    use argon2::Argon2;
    use argon2::password_hash::{PasswordHasher, SaltString};
    use secrecy::SecretString;

    use crate::config::AdminConfig;

    pub const EMAIL: &str = "admin@kaay.sn";
    pub const PASSWORD: &str = "teranga-2024";

    /// Hash `PASSWORD` with a fixed salt.
    #[allow(clippy::unwrap_used)]
    pub fn config() -> AdminConfig {
        let salt = SaltString::encode_b64(b"kaaysaltkaaysalt").unwrap();
        let hash = Argon2::default()
            .hash_password(PASSWORD.as_bytes(), &salt)
            .unwrap()
            .to_string();
        AdminConfig::new(EMAIL, SecretString::from(hash)).unwrap()
    }
}
