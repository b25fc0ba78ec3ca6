//! Category management.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use kaay_core::{Category, CategoryId, CategoryPatch, NewCategory};
use serde::Deserialize;
use tracing::instrument;

use super::Listing;
use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/reorder", post(reorder))
        .route("/{id}", patch(update).delete(delete))
        .route("/{id}/toggle", post(toggle))
}

/// New display order, first id first.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<CategoryId>,
}

/// Every category by `sort_order`, ties by name.
///
/// GET /api/categories
#[instrument(skip_all, fields(admin = %admin.email))]
async fn list(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Json<Listing<Category>>> {
    let mut store = state.store();
    let categories = store.load_categories().await?.to_vec();
    Ok(Json(Listing::new(categories, store.error())))
}

/// POST /api/categories
#[instrument(skip_all, fields(admin = %admin.email, name = %category.name))]
async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Json(category): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>)> {
    let created = state.store().create_category(&category).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/categories/{id}
#[instrument(skip_all, fields(admin = %admin.email, category_id = %id))]
async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<CategoryPatch>,
) -> Result<Json<Category>> {
    let updated = state
        .store()
        .update_category(&CategoryId::new(id), &patch)
        .await?;
    Ok(Json(updated))
}

/// DELETE /api/categories/{id}
#[instrument(skip_all, fields(admin = %admin.email, category_id = %id))]
async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.store().delete_category(&CategoryId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Show or hide a category.
///
/// POST /api/categories/{id}/toggle
#[instrument(skip_all, fields(admin = %admin.email, category_id = %id))]
async fn toggle(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Category>> {
    let updated = state
        .store()
        .toggle_category_active(&CategoryId::new(id))
        .await?;
    Ok(Json(updated))
}

/// POST /api/categories/reorder
#[instrument(skip_all, fields(admin = %admin.email, count = request.ids.len()))]
async fn reorder(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<Listing<Category>>> {
    let mut store = state.store();
    let categories = store.reorder_categories(&request.ids).await?.to_vec();
    Ok(Json(Listing::new(categories, store.error())))
}
