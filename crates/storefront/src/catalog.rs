//! Catalog reads shared by every shopper.
//!
//! Wraps the product and category services with an in-memory `moka` cache
//! (5 minute TTL). The home listing races the backend against a fixed timeout
//! and falls back to built-in sample data when the backend is slow or down;
//! fallback results are never cached so the next request tries again.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kaay_core::validation::CATEGORIES;
use kaay_core::{Category, CategoryId, Price, Product, ProductId, category::slugify};
use kaay_data::{DataError, Services};
use moka::future::Cache;
use serde::Serialize;
use tracing::{instrument, warn};

use crate::store::ProductStore;

/// How many new arrivals the home page features.
const FEATURED_LIMIT: usize = 8;

/// Landing page data.
#[derive(Debug, Clone, Serialize)]
pub struct HomeListing {
    pub categories: Vec<Category>,
    pub featured: Vec<Product>,
    pub products: Vec<Product>,
    /// Set when the backend timed out or failed and sample data is shown.
    pub from_fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CacheKey {
    Home,
    Products,
    Categories,
}

#[derive(Clone)]
enum CacheValue {
    Home(Arc<HomeListing>),
    Products(Arc<ProductStore>),
    Categories(Arc<Vec<Category>>),
}

/// Cached catalog reads.
#[derive(Clone)]
pub struct Catalog {
    services: Services,
    cache: Cache<CacheKey, CacheValue>,
    home_timeout: Duration,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("home_timeout", &self.home_timeout)
            .field("cached_entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl Catalog {
    #[must_use]
    pub fn new(services: Services, home_timeout: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();
        Self {
            services,
            cache,
            home_timeout,
        }
    }

    /// Home listing, from cache when possible.
    pub async fn home(&self) -> Arc<HomeListing> {
        if let Some(CacheValue::Home(listing)) = self.cache.get(&CacheKey::Home).await {
            return listing;
        }
        let listing = Arc::new(home_listing(&self.services, self.home_timeout).await);
        if !listing.from_fallback {
            self.cache
                .insert(CacheKey::Home, CacheValue::Home(Arc::clone(&listing)))
                .await;
        }
        listing
    }

    /// Active products with popularity loaded.
    ///
    /// A failed load is returned (with its `error` set) but not cached.
    pub async fn products(&self) -> Arc<ProductStore> {
        if let Some(CacheValue::Products(store)) = self.cache.get(&CacheKey::Products).await {
            return store;
        }
        let mut store = ProductStore::new();
        store.load_products(&self.services.products).await;
        store.load_popularity(&self.services.products).await;
        let store = Arc::new(store);
        if store.error().is_none() {
            self.cache
                .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&store)))
                .await;
        }
        store
    }

    /// Active categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the backend call fails.
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, DataError> {
        if let Some(CacheValue::Categories(categories)) =
            self.cache.get(&CacheKey::Categories).await
        {
            return Ok(categories);
        }
        let categories = Arc::new(self.services.categories.list_active().await?);
        self.cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::clone(&categories)),
            )
            .await;
        Ok(categories)
    }

    /// Drop every cached entry.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }
}

/// Load categories and products for the landing page within `timeout`.
///
/// On timeout or any backend failure, returns the built-in sample catalog
/// with `from_fallback` set.
#[instrument(skip(services))]
pub async fn home_listing(services: &Services, timeout: Duration) -> HomeListing {
    let fetch = async {
        tokio::try_join!(
            services.categories.list_active(),
            services.products.list_active()
        )
    };
    match tokio::time::timeout(timeout, fetch).await {
        Ok(Ok((categories, products))) => HomeListing {
            categories,
            featured: featured(&products),
            products,
            from_fallback: false,
        },
        Ok(Err(e)) => {
            warn!(error = %e, "Home listing failed, showing sample catalog");
            sample_listing()
        }
        Err(_) => {
            warn!(timeout_secs = timeout.as_secs(), "Home listing timed out, showing sample catalog");
            sample_listing()
        }
    }
}

fn featured(products: &[Product]) -> Vec<Product> {
    products
        .iter()
        .filter(|p| p.is_new)
        .take(FEATURED_LIMIT)
        .cloned()
        .collect()
}

fn sample_listing() -> HomeListing {
    let products = sample_products();
    HomeListing {
        categories: sample_categories(),
        featured: featured(&products),
        products,
        from_fallback: true,
    }
}

/// One sample category per known category name.
#[must_use]
pub fn sample_categories() -> Vec<Category> {
    let now = Utc::now();
    CATEGORIES
        .iter()
        .zip(0..)
        .map(|(name, sort_order)| Category {
            id: CategoryId::new(format!("sample-{}", slugify(name))),
            name: (*name).to_string(),
            slug: slugify(name),
            description: None,
            image_url: None,
            sort_order,
            is_active: true,
            created_at: now,
        })
        .collect()
}

/// A small fixed catalog shown when the backend is unreachable.
#[must_use]
pub fn sample_products() -> Vec<Product> {
    const SAMPLES: &[(&str, &str, &str, u64, Option<u64>, bool)] = &[
        ("sample-hoodie-dakar", "Hoodie Dakar", "Hoodies", 18_000, Some(22_000), true),
        ("sample-tee-teranga", "Tee Teranga", "T-shirts", 8_500, None, true),
        ("sample-cargo-medina", "Cargo Medina", "Pantalons", 15_000, None, false),
        ("sample-veste-goree", "Veste Gorée", "Vestes", 25_000, None, true),
        ("sample-snapback-kaay", "Snapback Kaay", "Casquettes", 6_000, Some(7_500), false),
        ("sample-sneaker-ngor", "Sneaker Ngor", "Sneakers", 35_000, None, false),
    ];

    let now = Utc::now();
    SAMPLES
        .iter()
        .map(|&(id, name, category, price, original, is_new)| {
            let sizes = if category == "Sneakers" {
                ["40", "41", "42", "43"].map(String::from).to_vec()
            } else if category == "Casquettes" {
                vec!["Unique".to_string()]
            } else {
                ["S", "M", "L", "XL"].map(String::from).to_vec()
            };
            Product {
                id: ProductId::new(id),
                name: name.to_string(),
                category: category.to_string(),
                price: Price::new(price),
                original_price: original.map(Price::new),
                stock: 10,
                sizes,
                colors: vec!["Noir".to_string(), "Blanc".to_string()],
                image_url: None,
                is_new,
                is_active: true,
                description: None,
                created_at: now,
                updated_at: now,
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use kaay_data::remote::{Filter, Query};
    use kaay_data::{Backend, BackendError, MemoryBackend, Table};
    use serde_json::{Value, json};

    use super::*;

    /// Backend whose selects never complete in time.
    struct StalledBackend;

    #[async_trait]
    impl Backend for StalledBackend {
        async fn select(&self, _query: &Query) -> Result<Vec<Value>, BackendError> {
            std::future::pending::<()>().await;
            Ok(Vec::new())
        }

        async fn insert(&self, _: Table, _: Vec<Value>) -> Result<Vec<Value>, BackendError> {
            Err(BackendError::Unconfigured)
        }

        async fn update(&self, _: Table, _: &[Filter], _: Value) -> Result<Vec<Value>, BackendError> {
            Err(BackendError::Unconfigured)
        }

        async fn delete(&self, _: Table, _: &[Filter]) -> Result<usize, BackendError> {
            Err(BackendError::Unconfigured)
        }

        async fn rpc(&self, _: &str, _: Value) -> Result<Value, BackendError> {
            Err(BackendError::Unconfigured)
        }
    }

    fn seeded() -> Arc<MemoryBackend> {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed(
            Table::Categories,
            &[json!({ "name": "Hoodies", "slug": "hoodies", "sort_order": 0, "is_active": true })],
        );
        backend.seed(
            Table::Products,
            &[json!({
                "name": "Hoodie", "category": "Hoodies", "price": 15000,
                "is_new": true, "is_active": true
            })],
        );
        backend
    }

    #[tokio::test]
    async fn live_listing_when_backend_answers() {
        let services = Services::new(seeded());
        let listing = home_listing(&services, Duration::from_secs(5)).await;
        assert!(!listing.from_fallback);
        assert_eq!(listing.categories.len(), 1);
        assert_eq!(listing.featured.len(), 1);
    }

    #[tokio::test]
    async fn fallback_on_error() {
        let backend = seeded();
        backend.fail_table(Table::Products);
        let listing = home_listing(&Services::new(backend), Duration::from_secs(5)).await;
        assert!(listing.from_fallback);
        assert_eq!(listing.products.len(), sample_products().len());
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_on_timeout() {
        let services = Services::new(Arc::new(StalledBackend));
        let listing = home_listing(&services, Duration::from_secs(10)).await;
        assert!(listing.from_fallback);
        assert_eq!(listing.categories.len(), CATEGORIES.len());
    }

    #[tokio::test]
    async fn fallback_is_not_cached() {
        let backend = seeded();
        backend.fail_table(Table::Categories);
        let catalog = Catalog::new(Services::new(backend.clone()), Duration::from_secs(5));
        assert!(catalog.home().await.from_fallback);

        backend.heal();
        assert!(!catalog.home().await.from_fallback);
    }

    #[tokio::test]
    async fn products_are_cached_until_invalidated() {
        let backend = seeded();
        let catalog = Catalog::new(Services::new(backend.clone()), Duration::from_secs(5));
        assert_eq!(catalog.products().await.products().len(), 1);

        backend.seed(
            Table::Products,
            &[json!({ "name": "Cap", "category": "Casquettes", "price": 5000, "is_active": true })],
        );
        assert_eq!(catalog.products().await.products().len(), 1);

        catalog.invalidate();
        assert_eq!(catalog.products().await.products().len(), 2);
    }

    #[test]
    fn sample_products_are_purchasable() {
        assert!(sample_products().iter().all(Product::is_purchasable));
    }
}
