//! Premium request review.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use kaay_core::{PremiumRequest, PremiumRequestId};
use tracing::instrument;

use super::Listing;
use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Build the premium requests router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}/approve", post(approve))
        .route("/{id}/reject", post(reject))
}

/// Every request, newest first. Served from the local snapshot, with
/// `error` set, when the backend is unreachable.
///
/// GET /api/premium-requests
#[instrument(skip_all, fields(admin = %admin.email))]
async fn list(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Json<Listing<PremiumRequest>>> {
    let mut store = state.store();
    let requests = store.load_premium_requests().await?.to_vec();
    Ok(Json(Listing::new(requests, store.error())))
}

/// POST /api/premium-requests/{id}/approve
#[instrument(skip_all, fields(admin = %admin.email, request_id = %id))]
async fn approve(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PremiumRequest>> {
    let approved = state
        .store()
        .approve_premium_request(&PremiumRequestId::new(id))
        .await?;
    Ok(Json(approved))
}

/// POST /api/premium-requests/{id}/reject
#[instrument(skip_all, fields(admin = %admin.email, request_id = %id))]
async fn reject(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PremiumRequest>> {
    let rejected = state
        .store()
        .reject_premium_request(&PremiumRequestId::new(id))
        .await?;
    Ok(Json(rejected))
}
