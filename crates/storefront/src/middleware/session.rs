//! Session middleware and the anonymous shopper identity.
//!
//! Sessions live in memory (tower-sessions `MemoryStore`); the only thing kept
//! in them is the shopper id. Everything the shopper owns is persisted in the
//! `LocalStore` under keys namespaced by that id, so a restart loses the
//! cookie mapping but never the data behind it.

use axum::{extract::FromRequestParts, http::request::Parts};
use kaay_core::ShopperId;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::StorefrontConfig;
use crate::error::AppError;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "kaay_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Session data keys.
pub mod keys {
    pub const SHOPPER_ID: &str = "shopper_id";
}

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Extractor yielding the current shopper, minting one on first visit.
///
/// # Example
///
/// ```rust,ignore
/// async fn cart(Shopper(shopper): Shopper, State(state): State<AppState>) -> Json<CartView> {
///     let session = state.open_session(shopper);
///     Json(CartView::from(&session.cart))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Shopper(pub ShopperId);

impl<S> FromRequestParts<S> for Shopper
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        if let Some(shopper) = session.get::<ShopperId>(keys::SHOPPER_ID).await? {
            return Ok(Self(shopper));
        }

        let shopper = ShopperId::generate();
        session.insert(keys::SHOPPER_ID, &shopper).await?;
        tracing::debug!(shopper = %shopper, "New shopper session");
        Ok(Self(shopper))
    }
}
