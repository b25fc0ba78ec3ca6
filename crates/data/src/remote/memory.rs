//! In-memory backend for tests and local development.
//!
//! Rows are JSON objects kept per table behind a mutex. Filter and order
//! semantics match the REST adapter. Inserts fill in `id`, `created_at`
//! and `updated_at` when absent; updates refresh `updated_at`. Tables can be
//! made to fail on demand to exercise error paths.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value, json};

use super::{Backend, Filter, Query, Table, functions};
use crate::error::BackendError;

/// Call counters per table, for asserting collaborator usage in tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub selects: usize,
    pub inserts: usize,
    pub updates: usize,
    pub deletes: usize,
}

#[derive(Default)]
struct State {
    tables: HashMap<Table, Vec<Map<String, Value>>>,
    failing: HashSet<Table>,
    empty_inserts: HashSet<Table>,
    calls: HashMap<Table, CallCounts>,
}

/// Backend that keeps every table in memory.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MemoryBackend")
            .field(
                "rows",
                &state
                    .tables
                    .iter()
                    .map(|(table, rows)| (table.as_str(), rows.len()))
                    .collect::<HashMap<_, _>>(),
            )
            .finish_non_exhaustive()
    }
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed rows directly, bypassing call counters and fault injection.
    pub fn seed<T: serde::Serialize>(&self, table: Table, rows: &[T]) {
        let mut state = self.lock();
        let stored = state.tables.entry(table).or_default();
        for row in rows {
            if let Ok(Value::Object(mut object)) = serde_json::to_value(row) {
                fill_generated_columns(&mut object);
                stored.push(object);
            }
        }
    }

    /// Make every call against `table` fail with `BackendError::Unavailable`.
    pub fn fail_table(&self, table: Table) {
        self.lock().failing.insert(table);
    }

    /// Make inserts into `table` succeed while returning no rows.
    pub fn return_nothing_on_insert(&self, table: Table) {
        self.lock().empty_inserts.insert(table);
    }

    /// Undo all fault injection.
    pub fn heal(&self) {
        let mut state = self.lock();
        state.failing.clear();
        state.empty_inserts.clear();
    }

    /// Snapshot of the rows stored in `table`.
    #[must_use]
    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.lock()
            .tables
            .get(&table)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    /// How many times each operation was invoked on `table`.
    #[must_use]
    pub fn calls(&self, table: Table) -> CallCounts {
        self.lock().calls.get(&table).copied().unwrap_or_default()
    }

    fn begin(&self, table: Table, count: impl FnOnce(&mut CallCounts)) -> Result<MutexGuard<'_, State>, BackendError> {
        let mut state = self.lock();
        count(state.calls.entry(table).or_default());
        if state.failing.contains(&table) {
            return Err(BackendError::Unavailable(table.as_str().to_string()));
        }
        Ok(state)
    }

    fn popular_products(state: &State, limit: usize) -> Value {
        let mut units: HashMap<String, u64> = HashMap::new();
        let orders = state.tables.get(&Table::Orders).map_or(&[][..], Vec::as_slice);
        for order in orders {
            if order.get("status").and_then(Value::as_str) == Some("cancelled") {
                continue;
            }
            let items = order.get("items").and_then(Value::as_array);
            for item in items.into_iter().flatten() {
                let (Some(id), Some(qty)) = (
                    item.get("product_id").and_then(Value::as_str),
                    item.get("quantity").and_then(Value::as_u64),
                ) else {
                    continue;
                };
                *units.entry(id.to_string()).or_default() += qty;
            }
        }
        let mut ranking: Vec<(String, u64)> = units.into_iter().collect();
        ranking.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranking.truncate(limit);
        Value::Array(
            ranking
                .into_iter()
                .map(|(product_id, units_sold)| {
                    json!({ "product_id": product_id, "units_sold": units_sold })
                })
                .collect(),
        )
    }

    fn category_stats(state: &State) -> Value {
        let mut counts: HashMap<String, u64> = HashMap::new();
        let products = state.tables.get(&Table::Products).map_or(&[][..], Vec::as_slice);
        for product in products {
            if product.get("is_active").and_then(Value::as_bool) == Some(false) {
                continue;
            }
            if let Some(category) = product.get("category").and_then(Value::as_str) {
                *counts.entry(category.to_string()).or_default() += 1;
            }
        }
        let mut stats: Vec<(String, u64)> = counts.into_iter().collect();
        stats.sort();
        Value::Array(
            stats
                .into_iter()
                .map(|(category, product_count)| {
                    json!({ "category": category, "product_count": product_count })
                })
                .collect(),
        )
    }
}

fn fill_generated_columns(row: &mut Map<String, Value>) {
    let now = Value::String(Utc::now().to_rfc3339());
    row.entry("id")
        .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
    row.entry("created_at").or_insert_with(|| now.clone());
    row.entry("updated_at").or_insert(now);
}

fn matches_all(filters: &[Filter], row: &Map<String, Value>) -> bool {
    filters.iter().all(|f| f.matches(row))
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, BackendError> {
        let state = self.begin(query.table, |c| c.selects += 1)?;
        let mut rows: Vec<&Map<String, Value>> = state
            .tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|row| query.matches(row)).collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| query.compare_rows(a, b));
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows.into_iter().cloned().map(Value::Object).collect())
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>, BackendError> {
        let mut state = self.begin(table, |c| c.inserts += 1)?;
        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let Value::Object(mut object) = row else {
                return Err(BackendError::Status {
                    status: 400,
                    message: "rows must be JSON objects".to_string(),
                });
            };
            fill_generated_columns(&mut object);
            inserted.push(object);
        }
        state
            .tables
            .entry(table)
            .or_default()
            .extend(inserted.iter().cloned());
        if state.empty_inserts.contains(&table) {
            return Ok(Vec::new());
        }
        Ok(inserted.into_iter().map(Value::Object).collect())
    }

    async fn update(
        &self,
        table: Table,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, BackendError> {
        let mut state = self.begin(table, |c| c.updates += 1)?;
        let Value::Object(patch) = patch else {
            return Err(BackendError::Status {
                status: 400,
                message: "patch must be a JSON object".to_string(),
            });
        };
        let now = Value::String(Utc::now().to_rfc3339());
        let mut updated = Vec::new();
        for row in state.tables.entry(table).or_default() {
            if !matches_all(filters, row) {
                continue;
            }
            for (key, value) in &patch {
                row.insert(key.clone(), value.clone());
            }
            row.insert("updated_at".to_string(), now.clone());
            updated.push(Value::Object(row.clone()));
        }
        Ok(updated)
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<usize, BackendError> {
        let mut state = self.begin(table, |c| c.deletes += 1)?;
        let rows = state.tables.entry(table).or_default();
        let before = rows.len();
        rows.retain(|row| !matches_all(filters, row));
        Ok(before - rows.len())
    }

    async fn rpc(&self, function: &str, args: Value) -> Result<Value, BackendError> {
        let state = self.lock();
        match function {
            functions::POPULAR_PRODUCTS => {
                let limit = args
                    .get("limit")
                    .and_then(Value::as_u64)
                    .and_then(|l| usize::try_from(l).ok())
                    .unwrap_or(usize::MAX);
                Ok(Self::popular_products(&state, limit))
            }
            functions::CATEGORY_STATS => Ok(Self::category_stats(&state)),
            other => Err(BackendError::UnknownFunction(other.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_fills_generated_columns() {
        let backend = MemoryBackend::new();
        let rows = backend
            .insert(Table::Categories, vec![json!({ "name": "Hoodies" })])
            .await
            .unwrap();
        let row = rows.first().unwrap();
        assert!(row["id"].is_string());
        assert!(row["created_at"].is_string());
        assert_eq!(backend.calls(Table::Categories).inserts, 1);
    }

    #[tokio::test]
    async fn insert_keeps_caller_id() {
        let backend = MemoryBackend::new();
        backend
            .insert(Table::Orders, vec![json!({ "id": "CMD-1" })])
            .await
            .unwrap();
        assert_eq!(backend.rows(Table::Orders)[0]["id"], "CMD-1");
    }

    #[tokio::test]
    async fn select_filters_orders_and_limits() {
        let backend = MemoryBackend::new();
        backend.seed(
            Table::Categories,
            &[
                json!({ "name": "Vestes", "sort_order": 1, "is_active": true }),
                json!({ "name": "Hoodies", "sort_order": 1, "is_active": true }),
                json!({ "name": "Sneakers", "sort_order": 0, "is_active": true }),
                json!({ "name": "Old", "sort_order": 0, "is_active": false }),
            ],
        );
        let rows = backend
            .select(
                &Query::table(Table::Categories)
                    .eq("is_active", true)
                    .order_asc("sort_order")
                    .order_asc("name")
                    .limit(2),
            )
            .await
            .unwrap();
        let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Sneakers", "Hoodies"]);
    }

    #[tokio::test]
    async fn update_merges_patch() {
        let backend = MemoryBackend::new();
        backend.seed(Table::Orders, &[json!({ "id": "CMD-1", "status": "pending" })]);
        let rows = backend
            .update(
                Table::Orders,
                &[Filter::eq("id", "CMD-1")],
                json!({ "status": "paid" }),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(backend.rows(Table::Orders)[0]["status"], "paid");
    }

    #[tokio::test]
    async fn delete_removes_matching_rows() {
        let backend = MemoryBackend::new();
        backend.seed(
            Table::Products,
            &[json!({ "id": "a" }), json!({ "id": "b" })],
        );
        let removed = backend
            .delete(Table::Products, &[Filter::eq("id", "a")])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(backend.rows(Table::Products).len(), 1);
    }

    #[tokio::test]
    async fn fault_injection() {
        let backend = MemoryBackend::new();
        backend.fail_table(Table::Products);
        assert!(matches!(
            backend.select(&Query::table(Table::Products)).await,
            Err(BackendError::Unavailable(_))
        ));
        assert_eq!(backend.calls(Table::Products).selects, 1);

        backend.heal();
        backend.return_nothing_on_insert(Table::Orders);
        let rows = backend
            .insert(Table::Orders, vec![json!({ "id": "CMD-1" })])
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn popular_products_ranks_units_sold() {
        let backend = MemoryBackend::new();
        backend.seed(
            Table::Orders,
            &[
                json!({ "status": "paid", "items": [
                    { "product_id": "a", "quantity": 1 },
                    { "product_id": "b", "quantity": 3 }
                ]}),
                json!({ "status": "cancelled", "items": [{ "product_id": "a", "quantity": 10 }] }),
                json!({ "status": "pending", "items": [{ "product_id": "a", "quantity": 1 }] }),
            ],
        );
        let ranking = backend
            .rpc(functions::POPULAR_PRODUCTS, json!({ "limit": 5 }))
            .await
            .unwrap();
        assert_eq!(
            ranking,
            json!([
                { "product_id": "b", "units_sold": 3 },
                { "product_id": "a", "units_sold": 2 }
            ])
        );
    }

    #[tokio::test]
    async fn unknown_rpc_is_an_error() {
        let backend = MemoryBackend::new();
        assert!(matches!(
            backend.rpc("order_stats", json!({})).await,
            Err(BackendError::UnknownFunction(_))
        ));
    }
}
