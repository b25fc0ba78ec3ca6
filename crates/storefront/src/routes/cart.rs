//! Cart route handlers.
//!
//! The cart is restored from the local store on each request and written back
//! on every mutation. Lines are snapshotted from the catalog product, never
//! from client-supplied prices.

use axum::{Json, extract::State};
use kaay_core::{Price, ProductId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::Shopper;
use crate::routes::catalog::find_active_product;
use crate::state::AppState;
use crate::store::{CartItemInput, CartLine, CartStore, LineKey};

/// Cart as returned to the client.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total: Price,
    pub item_count: u32,
}

impl From<&CartStore> for CartView {
    fn from(cart: &CartStore) -> Self {
        Self {
            lines: cart.lines().to_vec(),
            total: cart.total(),
            item_count: cart.item_count(),
        }
    }
}

/// Add-to-cart request.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
    pub quantity: Option<u32>,
}

/// Quantity update request. Zero or less removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    #[serde(flatten)]
    pub line: LineKey,
    pub quantity: i64,
}

/// Current cart.
///
/// GET /api/cart
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Shopper(shopper): Shopper) -> Json<CartView> {
    let session = state.open_session(shopper);
    Json(CartView::from(&session.cart))
}

/// Add a product variant, merging with an existing line.
///
/// POST /api/cart/add
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Shopper(shopper): Shopper,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let product = find_active_product(&state, &request.product_id).await?;

    if !product.sizes.is_empty() && !product.sizes.contains(&request.size) {
        return Err(AppError::BadRequest(format!(
            "size {} is not offered for this product",
            request.size
        )));
    }
    if !product.colors.is_empty() && !product.colors.contains(&request.color) {
        return Err(AppError::BadRequest(format!(
            "color {} is not offered for this product",
            request.color
        )));
    }

    let mut session = state.open_session(shopper);
    session.cart.add_item(CartItemInput::from_product(
        &product,
        &request.size,
        &request.color,
        request.quantity,
    ));
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product.id.as_str())]),
    );
    Ok(Json(CartView::from(&session.cart)))
}

/// Set a line's quantity.
///
/// POST /api/cart/update
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Shopper(shopper): Shopper,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let mut session = state.open_session(shopper);
    if !session.cart.update_quantity(&request.line, request.quantity) {
        return Err(AppError::NotFound("cart line".to_string()));
    }
    Ok(Json(CartView::from(&session.cart)))
}

/// Remove a line. Removing an absent line is a no-op.
///
/// POST /api/cart/remove
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Shopper(shopper): Shopper,
    Json(line): Json<LineKey>,
) -> Json<CartView> {
    let mut session = state.open_session(shopper);
    session.cart.remove_item(&line);
    Json(CartView::from(&session.cart))
}

/// Empty the cart.
///
/// POST /api/cart/clear
#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>, Shopper(shopper): Shopper) -> Json<CartView> {
    let mut session = state.open_session(shopper);
    session.cart.clear();
    Json(CartView::from(&session.cart))
}
