//! Back-office state: orders, products, categories and premium requests.
//!
//! Every write is one backend call followed by a full reload of the affected
//! list. Nothing is patched locally, so the lists always reflect the backend
//! or, when a load fails, the last good state plus an `error` message.

use std::sync::Arc;

use kaay_core::validation::{
    FieldErrors, validate_name, validate_new_product, validate_product_patch,
};
use kaay_core::{
    Category, CategoryId, CategoryPatch, NewCategory, NewProduct, Order, OrderId, OrderStatus,
    PremiumRequest, PremiumRequestId, PremiumRequestPatch, Product, ProductId, ProductPatch,
    category::slugify,
};
use kaay_data::local::{load_json, save_json};
use kaay_data::{CategoryStat, DataError, LocalStore, Services, keys};
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Errors surfaced by [`AdminStore`] operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Input failed validation; nothing was sent.
    #[error("invalid input: {0}")]
    Invalid(#[from] FieldErrors),

    /// The backend call failed.
    #[error(transparent)]
    Data(#[from] DataError),
}

/// In-memory back-office lists over the shared services.
pub struct AdminStore {
    services: Services,
    persistence: Arc<dyn LocalStore>,
    orders: Vec<Order>,
    products: Vec<Product>,
    categories: Vec<Category>,
    premium_requests: Vec<PremiumRequest>,
    error: Option<String>,
}

impl AdminStore {
    /// Create an empty store. Nothing is loaded until asked.
    #[must_use]
    pub fn new(services: Services, persistence: Arc<dyn LocalStore>) -> Self {
        Self {
            services,
            persistence,
            orders: Vec::new(),
            products: Vec::new(),
            categories: Vec::new(),
            premium_requests: Vec::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Categories by `sort_order`, ties by name.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn premium_requests(&self) -> &[PremiumRequest] {
        &self.premium_requests
    }

    /// Message of the last failed operation, cleared by the next success.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn fail(&mut self, error: impl Into<AdminError>) -> AdminError {
        let error = error.into();
        self.error = Some(error.to_string());
        error
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Reload every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Data` and keeps the previous list on failure.
    #[instrument(skip(self))]
    pub async fn load_orders(&mut self) -> Result<&[Order], AdminError> {
        let result = self.services.orders.list().await;
        self.settle_orders(result)?;
        Ok(&self.orders)
    }

    /// Reload every product, active or not.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Data` and keeps the previous list on failure.
    #[instrument(skip(self))]
    pub async fn load_products(&mut self) -> Result<&[Product], AdminError> {
        let result = self.services.products.list_all().await;
        self.settle_products(result)?;
        Ok(&self.products)
    }

    /// Reload every category, active or not.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Data` and keeps the previous list on failure.
    #[instrument(skip(self))]
    pub async fn load_categories(&mut self) -> Result<&[Category], AdminError> {
        let result = self.services.categories.list_all().await;
        self.settle_categories(result)?;
        Ok(&self.categories)
    }

    /// Reload premium requests, snapshotting them locally.
    ///
    /// When the backend fails and a snapshot exists, the snapshot is served
    /// and `error` is set; the call still succeeds.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Data` when the backend fails and no snapshot exists.
    #[instrument(skip(self))]
    pub async fn load_premium_requests(&mut self) -> Result<&[PremiumRequest], AdminError> {
        let result = self.services.premium.list().await;
        self.settle_premium_requests(result)?;
        Ok(&self.premium_requests)
    }

    /// Reload all four lists concurrently.
    ///
    /// Every list is attempted; the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns the first `AdminError` among the four loads.
    #[instrument(skip(self))]
    pub async fn load_all(&mut self) -> Result<(), AdminError> {
        let (orders, products, categories, premium) = tokio::join!(
            self.services.orders.list(),
            self.services.products.list_all(),
            self.services.categories.list_all(),
            self.services.premium.list(),
        );

        let results = [
            self.settle_orders(orders),
            self.settle_products(products),
            self.settle_categories(categories),
            self.settle_premium_requests(premium),
        ];
        let mut first_error = None;
        for result in results {
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }
        if let Some(e) = first_error {
            // A later success may have cleared it
            self.error = Some(e.to_string());
            return Err(e);
        }
        Ok(())
    }

    fn settle_orders(&mut self, result: Result<Vec<Order>, DataError>) -> Result<(), AdminError> {
        let orders = result.map_err(|e| self.fail(e))?;
        self.orders = orders;
        self.error = None;
        Ok(())
    }

    fn settle_products(
        &mut self,
        result: Result<Vec<Product>, DataError>,
    ) -> Result<(), AdminError> {
        let products = result.map_err(|e| self.fail(e))?;
        self.products = products;
        self.error = None;
        Ok(())
    }

    fn settle_categories(
        &mut self,
        result: Result<Vec<Category>, DataError>,
    ) -> Result<(), AdminError> {
        let mut categories = result.map_err(|e| self.fail(e))?;
        categories.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        self.categories = categories;
        self.error = None;
        Ok(())
    }

    fn settle_premium_requests(
        &mut self,
        result: Result<Vec<PremiumRequest>, DataError>,
    ) -> Result<(), AdminError> {
        match result {
            Ok(requests) => {
                save_json(&*self.persistence, keys::PREMIUM_REQUESTS, &requests);
                self.premium_requests = requests;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                let snapshot: Option<Vec<PremiumRequest>> =
                    load_json(&*self.persistence, keys::PREMIUM_REQUESTS);
                let Some(snapshot) = snapshot else {
                    return Err(self.fail(e));
                };
                warn!(error = %e, count = snapshot.len(), "Serving premium request snapshot");
                self.error = Some(e.to_string());
                self.premium_requests = snapshot;
                Ok(())
            }
        }
    }

    /// Active product count per category, computed by the backend.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Data` if the backend call fails.
    pub async fn category_stats(&self) -> Result<Vec<CategoryStat>, AdminError> {
        Ok(self.services.categories.stats().await?)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Set an order's status, then reload orders.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Data` if the update or the reload fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn update_order_status(
        &mut self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, AdminError> {
        let order = self
            .services
            .orders
            .update_status(id, status)
            .await
            .map_err(|e| self.fail(e))?;
        info!(status = %status, "Order status updated");
        self.load_orders().await?;
        Ok(order)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Validate and insert a product, then reload products.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` without calling the backend when the
    /// product fails validation, `AdminError::Data` otherwise.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&mut self, product: &NewProduct) -> Result<Product, AdminError> {
        validate_new_product(product).map_err(|e| self.fail(e))?;
        let created = self
            .services
            .products
            .create(product)
            .await
            .map_err(|e| self.fail(e))?;
        info!(product_id = %created.id, "Product created");
        self.load_products().await?;
        Ok(created)
    }

    /// Validate and apply a sparse patch, then reload products.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` when a present field fails validation,
    /// `AdminError::Data` otherwise.
    #[instrument(skip(self, patch), fields(product_id = %id))]
    pub async fn update_product(
        &mut self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, AdminError> {
        validate_product_patch(patch).map_err(|e| self.fail(e))?;
        let updated = self
            .services
            .products
            .update(id, patch)
            .await
            .map_err(|e| self.fail(e))?;
        self.load_products().await?;
        Ok(updated)
    }

    /// Delete a product, then reload products.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Data` if the delete or the reload fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&mut self, id: &ProductId) -> Result<(), AdminError> {
        self.services
            .products
            .delete(id)
            .await
            .map_err(|e| self.fail(e))?;
        info!("Product deleted");
        self.load_products().await?;
        Ok(())
    }

    /// Flip a product's `is_active`, then reload products.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Data` with `NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn toggle_product_active(&mut self, id: &ProductId) -> Result<Product, AdminError> {
        let known = self
            .products
            .iter()
            .find(|p| &p.id == id)
            .map(|p| p.is_active);
        let current = match known {
            Some(is_active) => is_active,
            None => {
                self.services
                    .products
                    .by_id(id)
                    .await
                    .map_err(|e| self.fail(e))?
                    .ok_or_else(|| self.fail(DataError::NotFound(format!("product {id}"))))?
                    .is_active
            }
        };
        let updated = self
            .services
            .products
            .set_active(id, !current)
            .await
            .map_err(|e| self.fail(e))?;
        info!(is_active = updated.is_active, "Product visibility toggled");
        self.load_products().await?;
        Ok(updated)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Validate and insert a category, then reload categories.
    ///
    /// A blank slug is derived from the name.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` for a blank or overlong name,
    /// `AdminError::Data` otherwise.
    #[instrument(skip(self, category), fields(name = %category.name))]
    pub async fn create_category(
        &mut self,
        category: &NewCategory,
    ) -> Result<Category, AdminError> {
        let mut errors = FieldErrors::default();
        errors.check("name", validate_name(&category.name));
        errors.into_result().map_err(|e| self.fail(e))?;

        let mut category = category.clone();
        category.name = category.name.trim().to_string();
        if category.slug.trim().is_empty() {
            category.slug = slugify(&category.name);
        }

        let created = self
            .services
            .categories
            .create(&category)
            .await
            .map_err(|e| self.fail(e))?;
        info!(category_id = %created.id, "Category created");
        self.load_categories().await?;
        Ok(created)
    }

    /// Validate and apply a sparse patch, then reload categories.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` for a blank or overlong name,
    /// `AdminError::Data` otherwise.
    #[instrument(skip(self, patch), fields(category_id = %id))]
    pub async fn update_category(
        &mut self,
        id: &CategoryId,
        patch: &CategoryPatch,
    ) -> Result<Category, AdminError> {
        let mut errors = FieldErrors::default();
        if let Some(name) = &patch.name {
            errors.check("name", validate_name(name));
        }
        errors.into_result().map_err(|e| self.fail(e))?;

        let updated = self
            .services
            .categories
            .update(id, patch)
            .await
            .map_err(|e| self.fail(e))?;
        self.load_categories().await?;
        Ok(updated)
    }

    /// Delete a category, then reload categories.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Data` if the delete or the reload fails.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete_category(&mut self, id: &CategoryId) -> Result<(), AdminError> {
        self.services
            .categories
            .delete(id)
            .await
            .map_err(|e| self.fail(e))?;
        info!("Category deleted");
        self.load_categories().await?;
        Ok(())
    }

    /// Flip a category's `is_active`, then reload categories.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Data` with `NotFound` if the category is not in
    /// the backend's list.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn toggle_category_active(
        &mut self,
        id: &CategoryId,
    ) -> Result<Category, AdminError> {
        if !self.categories.iter().any(|c| &c.id == id) {
            self.load_categories().await?;
        }
        let known = self
            .categories
            .iter()
            .find(|c| &c.id == id)
            .map(|c| c.is_active);
        let current =
            known.ok_or_else(|| self.fail(DataError::NotFound(format!("category {id}"))))?;

        let updated = self
            .services
            .categories
            .set_active(id, !current)
            .await
            .map_err(|e| self.fail(e))?;
        info!(is_active = updated.is_active, "Category visibility toggled");
        self.load_categories().await?;
        Ok(updated)
    }

    /// Give categories consecutive `sort_order` values in the given order,
    /// then reload categories.
    ///
    /// Updates stop at the first failure; the reload still shows whatever
    /// was applied.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Data` if an update or the reload fails.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn reorder_categories(
        &mut self,
        ids: &[CategoryId],
    ) -> Result<&[Category], AdminError> {
        let order: Vec<(CategoryId, i32)> = ids
            .iter()
            .cloned()
            .zip(0_i32..)
            .collect();
        let result = self.services.categories.reorder(&order).await;
        if let Err(e) = result {
            let e = self.fail(e);
            // Show partial progress before reporting
            if let Err(reload) = self.load_categories().await {
                warn!(error = %reload, "Reload after failed reorder also failed");
            }
            self.error = Some(e.to_string());
            return Err(e);
        }
        self.load_categories().await
    }

    // =========================================================================
    // Premium requests
    // =========================================================================

    /// Approve a request with a fresh access code, then reload requests.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Data` if the update or the reload fails.
    #[instrument(skip(self), fields(request_id = %id))]
    pub async fn approve_premium_request(
        &mut self,
        id: &PremiumRequestId,
    ) -> Result<PremiumRequest, AdminError> {
        self.review_premium_request(id, &PremiumRequestPatch::approve())
            .await
    }

    /// Reject a request, then reload requests.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Data` if the update or the reload fails.
    #[instrument(skip(self), fields(request_id = %id))]
    pub async fn reject_premium_request(
        &mut self,
        id: &PremiumRequestId,
    ) -> Result<PremiumRequest, AdminError> {
        self.review_premium_request(id, &PremiumRequestPatch::reject())
            .await
    }

    async fn review_premium_request(
        &mut self,
        id: &PremiumRequestId,
        patch: &PremiumRequestPatch,
    ) -> Result<PremiumRequest, AdminError> {
        let reviewed = self
            .services
            .premium
            .set_status(id, patch)
            .await
            .map_err(|e| self.fail(e))?;
        info!(status = ?reviewed.status, "Premium request reviewed");
        self.load_premium_requests().await?;
        Ok(reviewed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kaay_core::{Price, PremiumStatus};
    use kaay_data::{MemoryBackend, MemoryLocalStore, Table};
    use serde_json::json;

    use super::*;

    fn store_with(backend: &Arc<MemoryBackend>) -> (AdminStore, Arc<MemoryLocalStore>) {
        let local = Arc::new(MemoryLocalStore::new());
        let store = AdminStore::new(
            Services::new(Arc::clone(backend) as Arc<dyn kaay_data::Backend>),
            Arc::clone(&local) as Arc<dyn LocalStore>,
        );
        (store, local)
    }

    fn seeded() -> Arc<MemoryBackend> {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed(
            Table::Products,
            &[json!({
                "id": "p1", "name": "Hoodie Dakar", "category": "Hoodies",
                "price": 15000, "stock": 4, "sizes": ["M"], "colors": ["Noir"],
                "is_active": true
            })],
        );
        backend.seed(
            Table::Categories,
            &[
                json!({ "id": "c1", "name": "Vestes", "slug": "vestes", "sort_order": 1 }),
                json!({ "id": "c2", "name": "Hoodies", "slug": "hoodies", "sort_order": 1 }),
                json!({ "id": "c3", "name": "T-shirts", "slug": "t-shirts", "sort_order": 0 }),
            ],
        );
        backend.seed(
            Table::PremiumRequests,
            &[json!({ "id": "r1", "full_name": "Awa Ndiaye", "phone": "771234567" })],
        );
        backend
    }

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            category: "T-shirts".to_string(),
            price: Price::new(5000),
            original_price: None,
            stock: 20,
            sizes: vec!["M".to_string()],
            colors: vec!["Noir".to_string()],
            image_url: None,
            is_new: true,
            is_active: true,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_categories_sorted_with_name_tiebreak() {
        let backend = seeded();
        let (mut store, _) = store_with(&backend);
        let names: Vec<_> = store
            .load_categories()
            .await
            .unwrap()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(names, ["T-shirts", "Hoodies", "Vestes"]);
    }

    #[tokio::test]
    async fn test_create_product_reloads() {
        let backend = seeded();
        let (mut store, _) = store_with(&backend);
        store.load_products().await.unwrap();
        assert_eq!(store.products().len(), 1);

        store.create_product(&new_product("Tee Teranga")).await.unwrap();
        assert_eq!(store.products().len(), 2);
        // One select before, one after the insert
        let calls = backend.calls(Table::Products);
        assert_eq!(calls.inserts, 1);
        assert_eq!(calls.selects, 2);
    }

    #[tokio::test]
    async fn test_invalid_product_never_reaches_backend() {
        let backend = seeded();
        let (mut store, _) = store_with(&backend);
        let mut product = new_product("Tee");
        product.category = "Chaussettes".to_string();

        let err = store.create_product(&product).await.unwrap_err();
        assert!(matches!(err, AdminError::Invalid(ref fields) if fields.get("category").is_some()));
        assert_eq!(backend.calls(Table::Products).inserts, 0);
        assert!(store.error().is_some());
    }

    #[tokio::test]
    async fn test_failed_write_sets_error_and_keeps_list() {
        let backend = seeded();
        let (mut store, _) = store_with(&backend);
        store.load_products().await.unwrap();

        backend.fail_table(Table::Products);
        let err = store.delete_product(&ProductId::new("p1")).await.unwrap_err();
        assert!(matches!(err, AdminError::Data(_)));
        assert_eq!(store.products().len(), 1);
        assert!(store.error().is_some());

        backend.heal();
        store.load_products().await.unwrap();
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn test_toggle_product_active() {
        let backend = seeded();
        let (mut store, _) = store_with(&backend);

        let updated = store
            .toggle_product_active(&ProductId::new("p1"))
            .await
            .unwrap();
        assert!(!updated.is_active);
        assert!(!store.products()[0].is_active);

        let updated = store
            .toggle_product_active(&ProductId::new("p1"))
            .await
            .unwrap();
        assert!(updated.is_active);
    }

    #[tokio::test]
    async fn test_toggle_unknown_category() {
        let backend = seeded();
        let (mut store, _) = store_with(&backend);
        let err = store
            .toggle_category_active(&CategoryId::new("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Data(DataError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_category_derives_slug() {
        let backend = seeded();
        let (mut store, _) = store_with(&backend);
        let mut category = NewCategory::named("Casquettes", 5);
        category.slug = String::new();

        let created = store.create_category(&category).await.unwrap();
        assert_eq!(created.slug, "casquettes");
        assert_eq!(store.categories().len(), 4);
    }

    #[tokio::test]
    async fn test_blank_category_name_rejected() {
        let backend = seeded();
        let (mut store, _) = store_with(&backend);

        let err = store
            .create_category(&NewCategory::named("  ", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Invalid(ref fields) if fields.get("name").is_some()));

        let patch = CategoryPatch {
            name: Some(String::new()),
            ..CategoryPatch::default()
        };
        let err = store
            .update_category(&CategoryId::new("c1"), &patch)
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Invalid(_)));
        let calls = backend.calls(Table::Categories);
        assert_eq!(calls.inserts, 0);
        assert_eq!(calls.updates, 0);
    }

    #[tokio::test]
    async fn test_reorder_categories() {
        let backend = seeded();
        let (mut store, _) = store_with(&backend);
        let ids = ["c1", "c2", "c3"].map(CategoryId::new);

        let names: Vec<_> = store
            .reorder_categories(&ids)
            .await
            .unwrap()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(names, ["Vestes", "Hoodies", "T-shirts"]);
        assert_eq!(backend.calls(Table::Categories).updates, 3);
    }

    #[tokio::test]
    async fn test_approve_assigns_access_code() {
        let backend = seeded();
        let (mut store, _) = store_with(&backend);

        let approved = store
            .approve_premium_request(&PremiumRequestId::new("r1"))
            .await
            .unwrap();
        assert_eq!(approved.status, PremiumStatus::Approved);
        assert!(approved.access_code.is_some());
        assert_eq!(store.premium_requests()[0].status, PremiumStatus::Approved);
    }

    #[tokio::test]
    async fn test_reject_has_no_access_code() {
        let backend = seeded();
        let (mut store, _) = store_with(&backend);

        let rejected = store
            .reject_premium_request(&PremiumRequestId::new("r1"))
            .await
            .unwrap();
        assert_eq!(rejected.status, PremiumStatus::Rejected);
        assert!(rejected.access_code.is_none());
    }

    #[tokio::test]
    async fn test_premium_snapshot_fallback() {
        let backend = seeded();
        let (mut store, local) = store_with(&backend);
        store.load_premium_requests().await.unwrap();
        assert!(local.get(keys::PREMIUM_REQUESTS).unwrap().is_some());

        // A fresh store over a failing backend serves the snapshot
        backend.fail_table(Table::PremiumRequests);
        let mut fresh = AdminStore::new(
            Services::new(Arc::clone(&backend) as Arc<dyn kaay_data::Backend>),
            local,
        );
        let requests = fresh.load_premium_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(fresh.error().is_some());
    }

    #[tokio::test]
    async fn test_premium_failure_without_snapshot() {
        let backend = seeded();
        backend.fail_table(Table::PremiumRequests);
        let (mut store, _) = store_with(&backend);
        assert!(store.load_premium_requests().await.is_err());
    }

    #[tokio::test]
    async fn test_load_all_attempts_every_list() {
        let backend = seeded();
        backend.fail_table(Table::Orders);
        let (mut store, _) = store_with(&backend);

        assert!(store.load_all().await.is_err());
        assert!(store.error().is_some());
        assert_eq!(store.products().len(), 1);
        assert_eq!(store.categories().len(), 3);
    }
}
