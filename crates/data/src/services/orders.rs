//! Order access.

use std::sync::Arc;

use kaay_core::{NewOrder, Order, OrderId, OrderStatus, Phone};
use serde_json::json;
use tracing::{info, instrument, warn};

use super::{decode_first, decode_rows, encode};
use crate::error::{DataError, Result};
use crate::remote::{Backend, Filter, Query, Table};

const ENTITY: &str = "order";

/// Reads and writes the `orders` table.
#[derive(Clone)]
pub struct OrderService {
    backend: Arc<dyn Backend>,
}

impl OrderService {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Insert an order.
    ///
    /// The total is checked against the line items before anything is
    /// written. Returns `Ok(None)` when the backend accepts the insert but
    /// returns no row.
    ///
    /// # Errors
    ///
    /// Returns `DataError::TotalMismatch` without touching the backend if the
    /// total is inconsistent, or `DataError` if the insert fails.
    #[instrument(skip(self, order), fields(order_id = %order.id, total = %order.total))]
    pub async fn create(&self, order: &NewOrder) -> Result<Option<Order>> {
        if !order.is_total_consistent() {
            let err = DataError::TotalMismatch {
                expected: order.computed_total(),
                actual: order.total,
            };
            warn!(error = %err, "Refusing to write order");
            return Err(err);
        }

        let rows = self
            .backend
            .insert(Table::Orders, vec![encode(order)?])
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to create order"))?;
        let created: Option<Order> = decode_first(ENTITY, rows)?;
        if created.is_some() {
            info!("Order created");
        } else {
            warn!("Backend returned no order row");
        }
        Ok(created)
    }

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the backend call or decoding fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Order>> {
        let query = Query::table(Table::Orders).order_desc("created_at");
        let rows = self
            .backend
            .select(&query)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to load orders"))?;
        decode_rows(ENTITY, rows)
    }

    /// Look up one order.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the backend call or decoding fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn by_id(&self, id: &OrderId) -> Result<Option<Order>> {
        let query = Query::table(Table::Orders).eq("id", id.as_str()).limit(1);
        let rows = self
            .backend
            .select(&query)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to load order"))?;
        decode_first(ENTITY, rows)
    }

    /// Orders placed with this phone number, newest first.
    ///
    /// Orders are stored and matched by the digits of the number, so a
    /// leading `+` makes no difference.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the backend call or decoding fails.
    #[instrument(skip(self, phone))]
    pub async fn by_phone(&self, phone: &Phone) -> Result<Vec<Order>> {
        let query = Query::table(Table::Orders)
            .eq("phone", phone.digits())
            .order_desc("created_at");
        let rows = self
            .backend
            .select(&query)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to look up orders by phone"))?;
        decode_rows(ENTITY, rows)
    }

    /// Move an order to `status`.
    ///
    /// # Errors
    ///
    /// Returns `DataError::NotFound` if no order has this id.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order> {
        let rows = self
            .backend
            .update(
                Table::Orders,
                &[Filter::eq("id", id.as_str())],
                json!({ "status": status }),
            )
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to update order status"))?;
        decode_first(ENTITY, rows)?.ok_or_else(|| DataError::NotFound(format!("order {id}")))
    }
}
