//! Login and logout.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use kaay_data::keys;
use kaay_data::local::{forget, save_json};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::auth::{CurrentAdmin, LoginRequest, verify_login};
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAdminAuth, clear_current_admin, set_current_admin};
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

/// Verify credentials and start an admin session.
///
/// POST /auth/login
#[instrument(skip(state, session, request), fields(email = %request.email))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<CurrentAdmin>> {
    let admin = verify_login(state.config(), &request).map_err(|e| {
        warn!(error = %e, "Admin login failed");
        AppError::from(e)
    })?;

    set_current_admin(&session, &admin).await?;
    save_json(state.persistence(), keys::ADMIN_SESSION, &admin);
    set_sentry_user(&admin.email);
    info!("Admin logged in");

    Ok(Json(admin))
}

/// End the admin session.
///
/// POST /auth/logout
#[instrument(skip(state, session))]
async fn logout(State(state): State<AppState>, session: Session) -> Result<StatusCode> {
    clear_current_admin(&session).await?;
    forget(state.persistence(), keys::ADMIN_SESSION);
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in admin.
///
/// GET /auth/me
async fn me(RequireAdminAuth(admin): RequireAdminAuth) -> Json<CurrentAdmin> {
    Json(admin)
}
