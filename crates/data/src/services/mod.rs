//! Typed entity services over the [`Backend`] port.
//!
//! Each call is a single backend round-trip. Failures are logged here with
//! the operation name and returned to the caller; stores decide whether to
//! surface them or fall back to an empty value.

mod categories;
mod orders;
mod premium;
mod products;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{DataError, Result};
use crate::remote::Backend;

pub use categories::{CategoryService, CategoryStat};
pub use orders::OrderService;
pub use premium::PremiumRequestService;
pub use products::{PopularProduct, ProductService};

/// All entity services sharing one backend.
#[derive(Clone)]
pub struct Services {
    pub products: ProductService,
    pub categories: CategoryService,
    pub orders: OrderService,
    pub premium: PremiumRequestService,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

impl Services {
    /// Build every service over `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            products: ProductService::new(Arc::clone(&backend)),
            categories: CategoryService::new(Arc::clone(&backend)),
            orders: OrderService::new(Arc::clone(&backend)),
            premium: PremiumRequestService::new(backend),
        }
    }
}

fn decode_rows<T: DeserializeOwned>(entity: &'static str, rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| decode(entity, row))
        .collect()
}

fn decode<T: DeserializeOwned>(entity: &'static str, row: Value) -> Result<T> {
    serde_json::from_value(row).map_err(|source| DataError::Decode { entity, source })
}

/// Decode the first returned row, if any.
fn decode_first<T: DeserializeOwned>(entity: &'static str, rows: Vec<Value>) -> Result<Option<T>> {
    rows.into_iter()
        .next()
        .map(|row| decode(entity, row))
        .transpose()
}

fn encode<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(DataError::Encode)
}
