//! Favorites and saved profile.

use axum::{Json, extract::State};
use kaay_core::{Product, ProductId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::Shopper;
use crate::session::Profile;
use crate::state::AppState;

/// Favorites as returned to the client.
///
/// `products` holds the favorites still in the active catalog; ids of
/// products that were removed stay in `ids` until toggled off.
#[derive(Debug, Serialize)]
pub struct FavoritesView {
    pub ids: Vec<ProductId>,
    pub count: usize,
    pub products: Vec<Product>,
}

/// Toggle request.
#[derive(Debug, Deserialize)]
pub struct ToggleFavoriteRequest {
    pub product_id: ProductId,
}

/// Toggle outcome.
#[derive(Debug, Serialize)]
pub struct ToggleFavoriteResponse {
    pub product_id: ProductId,
    pub favorite: bool,
    pub count: usize,
}

/// GET /api/favorites
#[instrument(skip(state))]
pub async fn favorites(
    State(state): State<AppState>,
    Shopper(shopper): Shopper,
) -> Json<FavoritesView> {
    let session = state.open_session(shopper);
    let store = state.catalog().products().await;
    let ids = session.favorites.ids().to_vec();
    let products = ids
        .iter()
        .filter_map(|id| store.product_by_id(id))
        .cloned()
        .collect();

    Json(FavoritesView {
        count: ids.len(),
        ids,
        products,
    })
}

/// POST /api/favorites/toggle
#[instrument(skip(state))]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Shopper(shopper): Shopper,
    Json(request): Json<ToggleFavoriteRequest>,
) -> Json<ToggleFavoriteResponse> {
    let mut session = state.open_session(shopper);
    let favorite = session.favorites.toggle(&request.product_id);
    Json(ToggleFavoriteResponse {
        product_id: request.product_id,
        favorite,
        count: session.favorites.count(),
    })
}

/// Saved buyer details, `null` until first saved.
///
/// GET /api/profile
#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    Shopper(shopper): Shopper,
) -> Json<Option<Profile>> {
    let session = state.open_session(shopper);
    Json(session.profile().cloned())
}

/// Validate and save buyer details.
///
/// PUT /api/profile
#[instrument(skip(state, profile))]
pub async fn save_profile(
    State(state): State<AppState>,
    Shopper(shopper): Shopper,
    Json(profile): Json<Profile>,
) -> Result<Json<Profile>> {
    let mut session = state.open_session(shopper);
    let saved = session.save_profile(profile)?;
    Ok(Json(saved.clone()))
}
