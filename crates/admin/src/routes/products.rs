//! Product management.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use kaay_core::{NewProduct, Product, ProductId, ProductPatch};
use tracing::instrument;

use super::Listing;
use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", patch(update).delete(delete))
        .route("/{id}/toggle", post(toggle))
}

/// Every product, hidden ones included.
///
/// GET /api/products
#[instrument(skip_all, fields(admin = %admin.email))]
async fn list(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Json<Listing<Product>>> {
    let mut store = state.store();
    let products = store.load_products().await?.to_vec();
    Ok(Json(Listing::new(products, store.error())))
}

/// POST /api/products
#[instrument(skip_all, fields(admin = %admin.email, name = %product.name))]
async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Json(product): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let created = state.store().create_product(&product).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/products/{id}
#[instrument(skip_all, fields(admin = %admin.email, product_id = %id))]
async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>> {
    let updated = state
        .store()
        .update_product(&ProductId::new(id), &patch)
        .await?;
    Ok(Json(updated))
}

/// DELETE /api/products/{id}
#[instrument(skip_all, fields(admin = %admin.email, product_id = %id))]
async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.store().delete_product(&ProductId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Show or hide a product.
///
/// POST /api/products/{id}/toggle
#[instrument(skip_all, fields(admin = %admin.email, product_id = %id))]
async fn toggle(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let updated = state
        .store()
        .toggle_product_active(&ProductId::new(id))
        .await?;
    Ok(Json(updated))
}
