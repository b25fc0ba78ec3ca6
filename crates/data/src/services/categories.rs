//! Category access.

use std::sync::Arc;

use kaay_core::{Category, CategoryId, CategoryPatch, NewCategory};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{instrument, warn};

use super::{decode_first, decode_rows, encode};
use crate::error::{DataError, Result};
use crate::remote::{Backend, Filter, Query, Table, functions};

const ENTITY: &str = "category";

/// Active product count for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStat {
    pub category: String,
    pub product_count: u64,
}

/// Reads and writes the `categories` table.
#[derive(Clone)]
pub struct CategoryService {
    backend: Arc<dyn Backend>,
}

impl CategoryService {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    fn ordered(query: Query) -> Query {
        query.order_asc("sort_order").order_asc("name")
    }

    async fn fetch(&self, query: &Query) -> Result<Vec<Category>> {
        let rows = self.backend.select(query).await?;
        decode_rows(ENTITY, rows)
    }

    /// Active categories by `sort_order`, ties broken by name.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the backend call or decoding fails.
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<Category>> {
        let query = Self::ordered(Query::table(Table::Categories).eq("is_active", true));
        self.fetch(&query)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to load categories"))
    }

    /// Every category, same order as [`Self::list_active`].
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the backend call or decoding fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Category>> {
        let query = Self::ordered(Query::table(Table::Categories));
        self.fetch(&query)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to load categories"))
    }

    /// Insert a category.
    ///
    /// # Errors
    ///
    /// Returns `DataError::NotFound` if the backend returns no row.
    #[instrument(skip(self, category), fields(name = %category.name))]
    pub async fn create(&self, category: &NewCategory) -> Result<Category> {
        let rows = self
            .backend
            .insert(Table::Categories, vec![encode(category)?])
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to create category"))?;
        decode_first(ENTITY, rows)?
            .ok_or_else(|| DataError::NotFound(format!("created category {}", category.name)))
    }

    /// Apply a sparse patch.
    ///
    /// # Errors
    ///
    /// Returns `DataError::NotFound` if no category has this id.
    #[instrument(skip(self, patch), fields(category_id = %id))]
    pub async fn update(&self, id: &CategoryId, patch: &CategoryPatch) -> Result<Category> {
        let rows = self
            .backend
            .update(
                Table::Categories,
                &[Filter::eq("id", id.as_str())],
                encode(patch)?,
            )
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to update category"))?;
        decode_first(ENTITY, rows)?.ok_or_else(|| DataError::NotFound(format!("category {id}")))
    }

    /// Delete a category. Products keep their category name.
    ///
    /// # Errors
    ///
    /// Returns `DataError::NotFound` if no category has this id.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete(&self, id: &CategoryId) -> Result<()> {
        let removed = self
            .backend
            .delete(Table::Categories, &[Filter::eq("id", id.as_str())])
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to delete category"))?;
        if removed == 0 {
            return Err(DataError::NotFound(format!("category {id}")));
        }
        Ok(())
    }

    /// Show or hide a category.
    ///
    /// # Errors
    ///
    /// Returns `DataError::NotFound` if no category has this id.
    pub async fn set_active(&self, id: &CategoryId, is_active: bool) -> Result<Category> {
        let patch = CategoryPatch {
            is_active: Some(is_active),
            ..CategoryPatch::default()
        };
        self.update(id, &patch).await
    }

    /// Write new `sort_order` values, one update per category.
    ///
    /// Stops at the first failure; earlier updates stay applied.
    ///
    /// # Errors
    ///
    /// Returns the first `DataError` encountered.
    #[instrument(skip(self, order), fields(count = order.len()))]
    pub async fn reorder(&self, order: &[(CategoryId, i32)]) -> Result<()> {
        for (id, sort_order) in order {
            let patch = CategoryPatch {
                sort_order: Some(*sort_order),
                ..CategoryPatch::default()
            };
            self.update(id, &patch).await?;
        }
        Ok(())
    }

    /// Active product count per category.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the function call or decoding fails.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<Vec<CategoryStat>> {
        let value = self
            .backend
            .rpc(functions::CATEGORY_STATS, json!({}))
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to load category stats"))?;
        serde_json::from_value(value).map_err(|source| DataError::Decode {
            entity: "category stat",
            source,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::remote::MemoryBackend;

    fn service() -> CategoryService {
        CategoryService::new(Arc::new(MemoryBackend::new()))
    }

    fn names(categories: &[Category]) -> Vec<&str> {
        categories.iter().map(|c| c.name.as_str()).collect()
    }

    #[tokio::test]
    async fn listing_orders_by_sort_order_then_name() {
        let categories = service();
        categories.create(&NewCategory::named("Vestes", 1)).await.unwrap();
        categories.create(&NewCategory::named("Hoodies", 1)).await.unwrap();
        categories.create(&NewCategory::named("Sneakers", 0)).await.unwrap();

        let listed = categories.list_active().await.unwrap();
        assert_eq!(names(&listed), vec!["Sneakers", "Hoodies", "Vestes"]);
    }

    #[tokio::test]
    async fn reorder_rewrites_sort_order() {
        let categories = service();
        let a = categories.create(&NewCategory::named("A", 0)).await.unwrap();
        let b = categories.create(&NewCategory::named("B", 1)).await.unwrap();

        categories
            .reorder(&[(a.id.clone(), 1), (b.id.clone(), 0)])
            .await
            .unwrap();
        let listed = categories.list_all().await.unwrap();
        assert_eq!(names(&listed), vec!["B", "A"]);
    }

    #[tokio::test]
    async fn toggled_off_categories_leave_active_listing() {
        let categories = service();
        let a = categories.create(&NewCategory::named("A", 0)).await.unwrap();
        categories.set_active(&a.id, false).await.unwrap();

        assert!(categories.list_active().await.unwrap().is_empty());
        assert_eq!(categories.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stats_count_active_products() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed(
            Table::Products,
            &[
                json!({ "category": "Hoodies", "is_active": true }),
                json!({ "category": "Hoodies", "is_active": true }),
                json!({ "category": "Vestes", "is_active": false }),
            ],
        );
        let stats = CategoryService::new(backend).stats().await.unwrap();
        assert_eq!(
            stats,
            vec![CategoryStat {
                category: "Hoodies".to_string(),
                product_count: 2
            }]
        );
    }
}
