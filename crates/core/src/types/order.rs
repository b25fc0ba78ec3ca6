//! Orders and their frozen line-item snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OrderId, OrderStatus, PaymentMethod, Price, ProductId};

/// Buyer details copied into the order at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerInfo {
    pub name: String,
    pub phone: String,
    pub address: String,
}

/// One purchased line, snapshotted by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    pub size: String,
    pub color: String,
}

impl OrderItem {
    /// `price * quantity`.
    #[must_use]
    pub const fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// An order as stored in the `orders` table.
///
/// Orders reference no live entities: buyer and items are a transcript of
/// the checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(flatten)]
    pub buyer: BuyerInfo,
    pub items: Vec<OrderItem>,
    pub total: Price,
    #[serde(default)]
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub city: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Number of units across all items.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Insert shape for a new order.
///
/// The total is always derived from the items; there is no way to build a
/// `NewOrder` with a caller-supplied total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub id: OrderId,
    #[serde(flatten)]
    pub buyer: BuyerInfo,
    pub items: Vec<OrderItem>,
    pub total: Price,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub city: String,
}

impl NewOrder {
    /// Snapshot a checkout into an insertable order.
    #[must_use]
    pub fn new(
        id: OrderId,
        buyer: BuyerInfo,
        items: Vec<OrderItem>,
        payment_method: PaymentMethod,
        city: String,
    ) -> Self {
        let total = items.iter().map(OrderItem::line_total).sum();
        Self {
            id,
            buyer,
            items,
            total,
            status: OrderStatus::Pending,
            payment_method,
            city,
        }
    }

    /// Recompute the total from the items.
    #[must_use]
    pub fn computed_total(&self) -> Price {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Whether `total` matches the items.
    #[must_use]
    pub fn is_total_consistent(&self) -> bool {
        self.total == self.computed_total()
    }
}
