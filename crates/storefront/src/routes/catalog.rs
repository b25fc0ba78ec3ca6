//! Catalog route handlers: home listing, categories and products.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use kaay_core::{Category, Price, Product, ProductId};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::catalog::HomeListing;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::{
    CategoryFilter, ProductQuery, SearchMode, SortDirection, SortKey, TYPE_AHEAD_LIMIT,
};

/// How many related products the detail view shows.
const RELATED_LIMIT: usize = 4;

/// Listing query string.
///
/// `size` and `color` accept comma-separated lists.
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    pub category: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    #[serde(default)]
    pub new_only: bool,
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

impl TryFrom<ListingParams> for ProductQuery {
    type Error = AppError;

    fn try_from(params: ListingParams) -> Result<Self> {
        let category = params
            .category
            .as_deref()
            .and_then(|c| c.parse::<CategoryFilter>().ok())
            .unwrap_or_default();
        let sort = match params.sort.as_deref() {
            None | Some("") => None,
            Some(key) => {
                let key: SortKey = key.parse().map_err(AppError::BadRequest)?;
                let dir = match params.dir.as_deref() {
                    None | Some("") => SortDirection::default(),
                    Some(dir) => dir.parse().map_err(AppError::BadRequest)?,
                };
                Some((key, dir))
            }
        };
        Ok(Self {
            category,
            sizes: split_list(params.size.as_deref()),
            colors: split_list(params.color.as_deref()),
            min_price: params.min_price.map(Price::new),
            max_price: params.max_price.map(Price::new),
            search: params.q.filter(|q| !q.trim().is_empty()),
            new_only: params.new_only,
            sort,
        })
    }
}

/// Product listing response.
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub count: usize,
    /// Set when the catalog could not be loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Product detail response.
#[derive(Debug, Serialize)]
pub struct ProductDetailResponse {
    pub product: Product,
    pub related: Vec<Product>,
    pub units_sold: u64,
}

/// Search query string.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// Landing page data.
///
/// GET /api/home
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Json<HomeListing> {
    let listing = state.catalog().home().await;
    Json(HomeListing::clone(&listing))
}

/// Active categories in display order.
///
/// GET /api/categories
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = state.catalog().categories().await?;
    Ok(Json(categories.to_vec()))
}

/// Filtered, sorted product listing.
///
/// GET /api/products
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<ProductListResponse>> {
    let query = ProductQuery::try_from(params)?;
    let store = state.catalog().products().await;
    let products: Vec<Product> = store.apply(&query).into_iter().cloned().collect();

    Ok(Json(ProductListResponse {
        count: products.len(),
        products,
        error: store.error().map(String::from),
    }))
}

/// Type-ahead search.
///
/// Searches the backend, falling back to the cached catalog when the
/// backend call fails.
///
/// GET /api/products/search?q=
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<Product>> {
    if params.q.trim().is_empty() {
        return Json(Vec::new());
    }
    match state.services().products.search(&params.q, TYPE_AHEAD_LIMIT).await {
        Ok(products) => return Json(products),
        Err(e) => debug!(error = %e, "Searching the cached catalog instead"),
    }
    let store = state.catalog().products().await;
    Json(
        store
            .search(&params.q, SearchMode::TypeAhead)
            .into_iter()
            .cloned()
            .collect(),
    )
}

/// Product detail with related products.
///
/// GET /api/products/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetailResponse>> {
    let id = ProductId::new(id);
    let product = find_active_product(&state, &id).await?;
    let store = state.catalog().products().await;

    Ok(Json(ProductDetailResponse {
        related: store
            .related(&id, RELATED_LIMIT)
            .into_iter()
            .cloned()
            .collect(),
        units_sold: store.units_sold(&id),
        product,
    }))
}

/// Look up an active product, from the cached catalog first.
///
/// Falls back to the backend since the cache may predate the product.
pub(crate) async fn find_active_product(state: &AppState, id: &ProductId) -> Result<Product> {
    if let Some(product) = state.catalog().products().await.product_by_id(id) {
        return Ok(product.clone());
    }
    state
        .services()
        .products
        .by_id(id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}
