//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Readiness (backend configured)
//!
//! # Auth (email + password, one account)
//! POST /auth/login                      - Start a session
//! POST /auth/logout                     - End the session
//! GET  /auth/me                         - Logged-in admin
//!
//! # Everything below requires a logged-in admin (401 otherwise)
//! GET    /api/dashboard                 - Aggregates
//! GET    /api/orders?status=            - Orders, newest first
//! PATCH  /api/orders/{id}/status        - Change an order's status
//! GET    /api/products                  - Every product
//! POST   /api/products                  - Create
//! PATCH  /api/products/{id}             - Sparse update
//! DELETE /api/products/{id}             - Delete
//! POST   /api/products/{id}/toggle      - Show/hide
//! GET    /api/categories                - Every category
//! POST   /api/categories                - Create
//! PATCH  /api/categories/{id}           - Sparse update
//! DELETE /api/categories/{id}           - Delete
//! POST   /api/categories/{id}/toggle    - Show/hide
//! POST   /api/categories/reorder        - Rewrite sort order
//! GET    /api/premium-requests          - Premium requests
//! POST   /api/premium-requests/{id}/approve
//! POST   /api/premium-requests/{id}/reject
//! ```

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod orders;
pub mod premium;
pub mod products;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// A reloaded list, with the store's error message if any.
#[derive(Debug, Serialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub count: usize,
    pub error: Option<String>,
}

impl<T> Listing<T> {
    fn new(items: Vec<T>, error: Option<&str>) -> Self {
        Self {
            count: items.len(),
            items,
            error: error.map(String::from),
        }
    }
}

/// Create the authenticated API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::show))
        .nest("/orders", orders::router())
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/premium-requests", premium::router())
}

/// Create all routes for admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(auth::router())
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Readiness: 503 until a backend is configured.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.backend_configured() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
