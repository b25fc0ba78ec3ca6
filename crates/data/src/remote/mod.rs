//! Remote backend port and its adapters.
//!
//! The backend is a hosted relational store reached through a generic,
//! table-oriented interface: filtered select, insert returning rows, update
//! by filter, delete by filter, and a few server-side functions for
//! aggregate views. Rows travel as JSON objects; the services decode them.

mod memory;
mod query;
mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::BackendConfig;
use crate::error::BackendError;

pub use memory::{CallCounts, MemoryBackend};
pub use query::{Filter, FilterOp, OrderBy, Query};
pub use rest::RestBackend;

/// Tables the shop reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Products,
    Categories,
    Orders,
    PremiumRequests,
}

impl Table {
    /// Table name on the backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Categories => "categories",
            Self::Orders => "orders",
            Self::PremiumRequests => "premium_requests",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side functions exposed by the backend.
pub mod functions {
    /// Units sold per product, best sellers first. Args: `{ "limit": n }`.
    pub const POPULAR_PRODUCTS: &str = "popular_products";
    /// Active product count per category.
    pub const CATEGORY_STATS: &str = "category_stats";
}

/// Generic table-oriented access to the hosted backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Select rows matching the query.
    async fn select(&self, query: &Query) -> Result<Vec<Value>, BackendError>;

    /// Insert rows, returning them as stored (with generated columns).
    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>, BackendError>;

    /// Merge `patch` into every row matching `filters`, returning the updated rows.
    async fn update(
        &self,
        table: Table,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, BackendError>;

    /// Delete every row matching `filters`, returning how many were removed.
    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<usize, BackendError>;

    /// Call a server-side function.
    async fn rpc(&self, function: &str, args: Value) -> Result<Value, BackendError>;
}

/// Backend used when no URL/key is configured: every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredBackend;

#[async_trait]
impl Backend for UnconfiguredBackend {
    async fn select(&self, _query: &Query) -> Result<Vec<Value>, BackendError> {
        Err(BackendError::Unconfigured)
    }

    async fn insert(&self, _table: Table, _rows: Vec<Value>) -> Result<Vec<Value>, BackendError> {
        Err(BackendError::Unconfigured)
    }

    async fn update(
        &self,
        _table: Table,
        _filters: &[Filter],
        _patch: Value,
    ) -> Result<Vec<Value>, BackendError> {
        Err(BackendError::Unconfigured)
    }

    async fn delete(&self, _table: Table, _filters: &[Filter]) -> Result<usize, BackendError> {
        Err(BackendError::Unconfigured)
    }

    async fn rpc(&self, _function: &str, _args: Value) -> Result<Value, BackendError> {
        Err(BackendError::Unconfigured)
    }
}

/// Build the backend described by `config`.
///
/// Returns a [`RestBackend`] when configured, otherwise an
/// [`UnconfiguredBackend`] so the caller can start and degrade gracefully.
///
/// # Errors
///
/// Returns `BackendError::Http` if the HTTP client cannot be built.
pub fn connect(config: &BackendConfig) -> Result<Arc<dyn Backend>, BackendError> {
    match (&config.url, &config.anon_key) {
        (Some(url), Some(key)) => {
            tracing::info!(url = %url, "Using REST backend");
            Ok(Arc::new(RestBackend::new(url.clone(), key, config.timeout)?))
        }
        _ => {
            tracing::warn!("BACKEND_URL/BACKEND_ANON_KEY not set; remote operations will fail");
            Ok(Arc::new(UnconfiguredBackend))
        }
    }
}
