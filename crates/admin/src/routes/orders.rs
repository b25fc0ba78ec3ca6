//! Order management.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use kaay_core::{Order, OrderId, OrderStatus};
use serde::Deserialize;
use tracing::instrument;

use super::Listing;
use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}/status", patch(update_status))
}

/// Order listing filters.
#[derive(Debug, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}

/// Status change request.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// Every order, newest first, optionally one status only.
///
/// GET /api/orders
#[instrument(skip_all, fields(admin = %admin.email, status = ?filter.status))]
async fn list(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Listing<Order>>> {
    let mut store = state.store();
    let orders = store
        .load_orders()
        .await?
        .iter()
        .filter(|o| filter.status.is_none_or(|status| o.status == status))
        .cloned()
        .collect();
    Ok(Json(Listing::new(orders, store.error())))
}

/// PATCH /api/orders/{id}/status
#[instrument(skip_all, fields(admin = %admin.email, order_id = %id, status = %update.status))]
async fn update_status(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Order>> {
    let order = state
        .store()
        .update_order_status(&OrderId::new(id), update.status)
        .await?;
    Ok(Json(order))
}
