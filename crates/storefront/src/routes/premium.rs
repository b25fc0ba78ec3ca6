//! Premium membership request form.

use axum::{Json, extract::State, http::StatusCode};
use kaay_core::validation::validate_premium_request;
use kaay_core::{NewPremiumRequest, PremiumRequest};
use tracing::{info, instrument};

use crate::error::Result;
use crate::state::AppState;

/// Submit a premium request for review.
///
/// POST /api/premium-requests
#[instrument(skip(state, request))]
pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<NewPremiumRequest>,
) -> Result<(StatusCode, Json<PremiumRequest>)> {
    validate_premium_request(&request)?;
    let created = state.services().premium.submit(&request).await?;
    info!(request_id = %created.id, "Premium request submitted");
    Ok((StatusCode::CREATED, Json(created)))
}
