//! Dashboard aggregates.

use axum::{Json, extract::State};
use kaay_core::PremiumStatus;
use kaay_data::CategoryStat;
use serde::Serialize;
use tracing::{instrument, warn};

use crate::middleware::RequireAdminAuth;
use crate::stats::DashboardStats;
use crate::state::AppState;

/// Dashboard payload. `error` is set when some list failed to load; the
/// aggregates then cover whatever did load.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub pending_premium_requests: usize,
    /// Empty when the backend cannot compute it.
    pub category_stats: Vec<CategoryStat>,
    pub error: Option<String>,
}

/// GET /api/dashboard
#[instrument(skip_all, fields(admin = %admin.email))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Json<DashboardResponse> {
    let mut store = state.store();
    let stats_store = state.store();
    let (loaded, category_stats) =
        tokio::join!(store.load_all(), stats_store.category_stats());
    if let Err(e) = loaded {
        warn!(error = %e, "Dashboard loaded partially");
    }
    let category_stats = category_stats.unwrap_or_else(|e| {
        warn!(error = %e, "Category stats unavailable");
        Vec::new()
    });

    let stats = DashboardStats::compute(store.orders(), store.products());
    let pending_premium_requests = store
        .premium_requests()
        .iter()
        .filter(|r| r.status == PremiumStatus::Pending)
        .count();

    Json(DashboardResponse {
        stats,
        pending_premium_requests,
        category_stats,
        error: store.error().map(String::from),
    })
}
