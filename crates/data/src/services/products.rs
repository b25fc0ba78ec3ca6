//! Product catalog access.

use std::sync::Arc;

use kaay_core::{NewProduct, Product, ProductId, ProductPatch};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{instrument, warn};

use super::{decode_first, decode_rows, encode};
use crate::error::{DataError, Result};
use crate::remote::{Backend, Filter, Query, Table, functions};

const ENTITY: &str = "product";

/// One row of the popularity ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularProduct {
    pub product_id: ProductId,
    pub units_sold: u64,
}

/// Reads and writes the `products` table.
#[derive(Clone)]
pub struct ProductService {
    backend: Arc<dyn Backend>,
}

impl ProductService {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    async fn fetch(&self, query: &Query) -> Result<Vec<Product>> {
        let rows = self.backend.select(query).await?;
        decode_rows(ENTITY, rows)
    }

    /// Active products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the backend call or decoding fails.
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<Product>> {
        let query = Query::table(Table::Products)
            .eq("is_active", true)
            .order_desc("created_at");
        self.fetch(&query)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to load active products"))
    }

    /// Every product including inactive ones, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the backend call or decoding fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Product>> {
        let query = Query::table(Table::Products).order_desc("created_at");
        self.fetch(&query)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to load products"))
    }

    /// Active products whose category equals `category` exactly.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the backend call or decoding fails.
    #[instrument(skip(self))]
    pub async fn by_category(&self, category: &str) -> Result<Vec<Product>> {
        let query = Query::table(Table::Products)
            .eq("is_active", true)
            .eq("category", category)
            .order_desc("created_at");
        self.fetch(&query)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to load category products"))
    }

    /// Look up one product.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the backend call or decoding fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn by_id(&self, id: &ProductId) -> Result<Option<Product>> {
        let query = Query::table(Table::Products).eq("id", id.as_str()).limit(1);
        let rows = self
            .backend
            .select(&query)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to load product"))?;
        decode_first(ENTITY, rows)
    }

    /// Active products whose name, category or description contains `term`.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the backend call or decoding fails.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str, limit: usize) -> Result<Vec<Product>> {
        let term = term.trim();
        let query = Query::table(Table::Products)
            .eq("is_active", true)
            .any_of(vec![
                Filter::contains("name", term),
                Filter::contains("category", term),
                Filter::contains("description", term),
            ])
            .order_asc("name")
            .limit(limit);
        self.fetch(&query)
            .await
            .inspect_err(|e| warn!(error = %e, "Product search failed"))
    }

    /// Insert a product and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns `DataError::NotFound` if the backend returns no row.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(&self, product: &NewProduct) -> Result<Product> {
        let rows = self
            .backend
            .insert(Table::Products, vec![encode(product)?])
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to create product"))?;
        decode_first(ENTITY, rows)?
            .ok_or_else(|| DataError::NotFound(format!("created product {}", product.name)))
    }

    /// Apply a sparse patch.
    ///
    /// # Errors
    ///
    /// Returns `DataError::NotFound` if no product has this id.
    #[instrument(skip(self, patch), fields(product_id = %id))]
    pub async fn update(&self, id: &ProductId, patch: &ProductPatch) -> Result<Product> {
        let rows = self
            .backend
            .update(Table::Products, &[Filter::eq("id", id.as_str())], encode(patch)?)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to update product"))?;
        decode_first(ENTITY, rows)?.ok_or_else(|| DataError::NotFound(format!("product {id}")))
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `DataError::NotFound` if no product has this id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<()> {
        let removed = self
            .backend
            .delete(Table::Products, &[Filter::eq("id", id.as_str())])
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to delete product"))?;
        if removed == 0 {
            return Err(DataError::NotFound(format!("product {id}")));
        }
        Ok(())
    }

    /// Show or hide a product in the storefront.
    ///
    /// # Errors
    ///
    /// Returns `DataError::NotFound` if no product has this id.
    pub async fn set_active(&self, id: &ProductId, is_active: bool) -> Result<Product> {
        self.update(id, &ProductPatch::active(is_active)).await
    }

    /// Best sellers by units sold, excluding cancelled orders.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the function call or decoding fails.
    #[instrument(skip(self))]
    pub async fn popular(&self, limit: usize) -> Result<Vec<PopularProduct>> {
        let value = self
            .backend
            .rpc(functions::POPULAR_PRODUCTS, json!({ "limit": limit }))
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to load popular products"))?;
        serde_json::from_value(value).map_err(|source| DataError::Decode {
            entity: "popular product",
            source,
        })
    }
}
