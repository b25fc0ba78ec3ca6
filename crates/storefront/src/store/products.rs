//! Product list and the filter/sort/search pipeline.
//!
//! The store holds the active catalog as loaded from the backend. Every view
//! (`apply`, `search`, `related`) borrows from that list and never reorders
//! or mutates it; sorts are stable so equal keys keep catalog order.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

use kaay_core::{Price, Product, ProductId};
use kaay_data::ProductService;
use serde::{Deserialize, Serialize};

/// Result cap for type-ahead search.
pub const TYPE_AHEAD_LIMIT: usize = 8;

/// How many best sellers feed the popularity sort.
const POPULARITY_DEPTH: usize = 100;

/// Category restriction; `All` is the "no restriction" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Named(s.to_string()))
        }
    }
}

impl CategoryFilter {
    fn admits(&self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Named(category) => product.category == *category,
        }
    }
}

/// Where a search result list is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Capped at [`TYPE_AHEAD_LIMIT`].
    TypeAhead,
    /// Unbounded.
    Listing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Name,
    Price,
    #[default]
    Date,
    Popularity,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "price" => Ok(Self::Price),
            "date" | "newest" => Ok(Self::Date),
            "popularity" | "popular" => Ok(Self::Popularity),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}

/// Listing criteria. Empty `sizes`/`colors` mean "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: CategoryFilter,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    /// Inclusive.
    pub min_price: Option<Price>,
    /// Inclusive.
    pub max_price: Option<Price>,
    pub search: Option<String>,
    pub new_only: bool,
    pub sort: Option<(SortKey, SortDirection)>,
}

/// Catalog state for the storefront.
#[derive(Debug, Clone, Default)]
pub struct ProductStore {
    products: Vec<Product>,
    popularity: HashMap<ProductId, u64>,
    loading: bool,
    error: Option<String>,
}

impl ProductStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store over an already-loaded list.
    #[must_use]
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products,
            ..Self::default()
        }
    }

    /// Fetch every active product.
    ///
    /// On failure the current list is kept and `error` is set.
    pub async fn load_products(&mut self, service: &ProductService) {
        self.loading = true;
        match service.list_active().await {
            Ok(products) => {
                self.products = products;
                self.error = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
        self.loading = false;
    }

    /// Fetch the best-seller ranking used by [`SortKey::Popularity`].
    ///
    /// A failure leaves every product at zero units; it does not set `error`.
    pub async fn load_popularity(&mut self, service: &ProductService) {
        if let Ok(ranking) = service.popular(POPULARITY_DEPTH).await {
            self.popularity = ranking
                .into_iter()
                .map(|row| (row.product_id, row.units_sold))
                .collect();
        }
    }

    /// Replace the list with one category, or the whole catalog for `All`.
    pub async fn filter_by_category(&mut self, service: &ProductService, filter: &CategoryFilter) {
        let CategoryFilter::Named(category) = filter else {
            self.load_products(service).await;
            return;
        };
        self.loading = true;
        match service.by_category(category).await {
            Ok(products) => {
                self.products = products;
                self.error = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
        self.loading = false;
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Units sold, zero when unranked.
    #[must_use]
    pub fn units_sold(&self, id: &ProductId) -> u64 {
        self.popularity.get(id).copied().unwrap_or(0)
    }

    /// Case-insensitive substring match over name, category and description.
    ///
    /// A blank term returns the whole list (still capped in type-ahead mode).
    #[must_use]
    pub fn search(&self, term: &str, mode: SearchMode) -> Vec<&Product> {
        let needle = term.trim().to_lowercase();
        let hits = self
            .products
            .iter()
            .filter(|product| needle.is_empty() || matches_term(product, &needle));
        match mode {
            SearchMode::TypeAhead => hits.take(TYPE_AHEAD_LIMIT).collect(),
            SearchMode::Listing => hits.collect(),
        }
    }

    /// Filter then sort according to `query`.
    #[must_use]
    pub fn apply(&self, query: &ProductQuery) -> Vec<&Product> {
        let needle = query
            .search
            .as_deref()
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty());

        let mut view: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| query.category.admits(p))
            .filter(|p| query.sizes.is_empty() || p.sizes.iter().any(|s| query.sizes.contains(s)))
            .filter(|p| {
                query.colors.is_empty() || p.colors.iter().any(|c| query.colors.contains(c))
            })
            .filter(|p| query.min_price.is_none_or(|min| p.price >= min))
            .filter(|p| query.max_price.is_none_or(|max| p.price <= max))
            .filter(|p| needle.as_deref().is_none_or(|n| matches_term(p, n)))
            .filter(|p| !query.new_only || p.is_new)
            .collect();

        if let Some((key, direction)) = query.sort {
            view.sort_by(|a, b| {
                let ord = self.compare(key, a, b);
                match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }
        view
    }

    fn compare(&self, key: SortKey, a: &Product, b: &Product) -> Ordering {
        match key {
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::Price => a.price.cmp(&b.price),
            SortKey::Date => a.created_at.cmp(&b.created_at),
            SortKey::Popularity => self.units_sold(&a.id).cmp(&self.units_sold(&b.id)),
        }
    }

    /// Linear scan by id.
    #[must_use]
    pub fn product_by_id(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.id == *id)
    }

    /// Other products in the same category, catalog order.
    #[must_use]
    pub fn related(&self, id: &ProductId, limit: usize) -> Vec<&Product> {
        let Some(product) = self.product_by_id(id) else {
            return Vec::new();
        };
        self.products
            .iter()
            .filter(|other| other.id != *id && other.category == product.category)
            .take(limit)
            .collect()
    }
}

fn matches_term(product: &Product, needle: &str) -> bool {
    product.name.to_lowercase().contains(needle)
        || product.category.to_lowercase().contains(needle)
        || product
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use kaay_data::{MemoryBackend, Table};
    use serde_json::json;

    use super::*;

    fn product(id: &str, name: &str, category: &str, price: u64, age_days: i64) -> Product {
        let created = Utc::now() - Duration::days(age_days);
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            category: category.to_string(),
            price: Price::new(price),
            original_price: None,
            stock: 20,
            sizes: vec!["M".to_string(), "L".to_string()],
            colors: vec!["Noir".to_string()],
            image_url: None,
            is_new: age_days < 7,
            is_active: true,
            description: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn catalog() -> ProductStore {
        let mut hoodie = product("h1", "Hoodie Dakar", "Hoodies", 15_000, 1);
        hoodie.sizes = vec!["XL".to_string()];
        hoodie.description = Some("Molleton épais".to_string());
        let mut cap = product("c1", "Snapback", "Casquettes", 5_000, 30);
        cap.colors = vec!["Rouge".to_string()];
        ProductStore::with_products(vec![
            hoodie,
            product("t1", "Tee Wax", "T-shirts", 7_500, 10),
            cap,
            product("t2", "Tee Basic", "T-shirts", 7_500, 3),
        ])
    }

    fn ids(view: &[&Product]) -> Vec<String> {
        view.iter().map(|p| p.id.to_string()).collect()
    }

    #[test]
    fn test_all_category_equals_no_filter() {
        let store = catalog();
        let all = store.apply(&ProductQuery {
            category: "all".parse().unwrap(),
            ..ProductQuery::default()
        });
        assert_eq!(ids(&all), ids(&store.apply(&ProductQuery::default())));
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_search_blank_and_no_match() {
        let store = catalog();
        assert_eq!(store.search("", SearchMode::Listing).len(), 4);
        assert_eq!(store.search("   ", SearchMode::Listing).len(), 4);
        assert!(store.search("zzz-no-match", SearchMode::Listing).is_empty());
    }

    #[test]
    fn test_search_fields_case_insensitive() {
        let store = catalog();
        assert_eq!(ids(&store.search("HOODIE", SearchMode::Listing)), vec!["h1"]);
        assert_eq!(store.search("t-shirts", SearchMode::Listing).len(), 2);
        assert_eq!(ids(&store.search("molleton", SearchMode::Listing)), vec!["h1"]);
    }

    #[test]
    fn test_type_ahead_is_capped() {
        let products = (0..12)
            .map(|i| product(&format!("p{i}"), &format!("Tee {i}"), "T-shirts", 1000, i))
            .collect();
        let store = ProductStore::with_products(products);
        assert_eq!(store.search("tee", SearchMode::TypeAhead).len(), TYPE_AHEAD_LIMIT);
        assert_eq!(store.search("tee", SearchMode::Listing).len(), 12);
    }

    #[test]
    fn test_combined_filters() {
        let store = catalog();
        let query = ProductQuery {
            category: CategoryFilter::Named("T-shirts".to_string()),
            sizes: vec!["M".to_string()],
            min_price: Some(Price::new(7_500)),
            max_price: Some(Price::new(7_500)),
            ..ProductQuery::default()
        };
        assert_eq!(ids(&store.apply(&query)), vec!["t1", "t2"]);

        let query = ProductQuery {
            colors: vec!["Rouge".to_string()],
            ..ProductQuery::default()
        };
        assert_eq!(ids(&store.apply(&query)), vec!["c1"]);

        let query = ProductQuery {
            new_only: true,
            search: Some("tee".to_string()),
            ..ProductQuery::default()
        };
        assert_eq!(ids(&store.apply(&query)), vec!["t2"]);
    }

    #[test]
    fn test_sort_is_stable_and_non_mutating() {
        let store = catalog();
        let by_price = store.apply(&ProductQuery {
            sort: Some((SortKey::Price, SortDirection::Asc)),
            ..ProductQuery::default()
        });
        // t1 and t2 tie on price and keep catalog order
        assert_eq!(ids(&by_price), vec!["c1", "t1", "t2", "h1"]);
        assert_eq!(store.products()[0].id, ProductId::new("h1"));

        let by_name = store.apply(&ProductQuery {
            sort: Some((SortKey::Name, SortDirection::Desc)),
            ..ProductQuery::default()
        });
        assert_eq!(ids(&by_name), vec!["t1", "t2", "c1", "h1"]);

        let newest = store.apply(&ProductQuery {
            sort: Some((SortKey::Date, SortDirection::Desc)),
            ..ProductQuery::default()
        });
        assert_eq!(ids(&newest), vec!["h1", "t2", "t1", "c1"]);
    }

    #[test]
    fn test_lookup_and_related() {
        let store = catalog();
        assert_eq!(
            store.product_by_id(&ProductId::new("c1")).unwrap().name,
            "Snapback"
        );
        assert!(store.product_by_id(&ProductId::new("nope")).is_none());
        assert_eq!(ids(&store.related(&ProductId::new("t1"), 4)), vec!["t2"]);
        assert!(store.related(&ProductId::new("nope"), 4).is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_keeps_list() {
        let backend = Arc::new(MemoryBackend::new());
        let service = ProductService::new(backend.clone());
        let mut store = catalog();

        backend.fail_table(Table::Products);
        store.load_products(&service).await;
        assert!(store.error().is_some());
        assert!(!store.is_loading());
        assert_eq!(store.products().len(), 4);
    }

    #[tokio::test]
    async fn test_popularity_sort() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed(
            Table::Products,
            &[
                json!({ "id": "a", "name": "A", "category": "Hoodies", "price": 1000, "stock": 5, "is_active": true }),
                json!({ "id": "b", "name": "B", "category": "Hoodies", "price": 1000, "stock": 5, "is_active": true }),
            ],
        );
        backend.seed(
            Table::Orders,
            &[json!({ "status": "paid", "items": [{ "product_id": "b", "quantity": 3 }] })],
        );
        let service = ProductService::new(backend);
        let mut store = ProductStore::new();
        store.load_products(&service).await;
        store.load_popularity(&service).await;

        let view = store.apply(&ProductQuery {
            sort: Some((SortKey::Popularity, SortDirection::Desc)),
            ..ProductQuery::default()
        });
        assert_eq!(ids(&view), vec!["b", "a"]);
        assert_eq!(store.units_sold(&ProductId::new("a")), 0);
    }

    #[tokio::test]
    async fn test_filter_by_category_refetches() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed(
            Table::Products,
            &[
                json!({ "id": "a", "name": "A", "category": "Hoodies", "price": 1000, "stock": 5, "is_active": true }),
                json!({ "id": "b", "name": "B", "category": "Vestes", "price": 1000, "stock": 5, "is_active": true }),
            ],
        );
        let service = ProductService::new(backend);
        let mut store = ProductStore::new();

        store
            .filter_by_category(&service, &CategoryFilter::Named("Vestes".to_string()))
            .await;
        assert_eq!(store.products().len(), 1);

        store.filter_by_category(&service, &CategoryFilter::All).await;
        assert_eq!(store.products().len(), 2);
    }
}
