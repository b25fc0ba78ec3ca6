//! Shopping cart.
//!
//! Lines are identified by the full [`LineKey`] (product, size, color) so two
//! variants of one product never merge. Unit price, original price, name and
//! image are captured when the line is added and never re-fetched. `total`
//! and `item_count` are recomputed after every mutation, and the line list is
//! written through to the local store.

use std::sync::Arc;

use kaay_core::{OrderItem, Price, Product, ProductId};
use kaay_data::LocalStore;
use kaay_data::local::{load_json, save_json};
use serde::{Deserialize, Serialize};

/// Identity of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
}

impl LineKey {
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, size: &str, color: &str) -> Self {
        Self {
            product_id: product_id.into(),
            size: size.to_string(),
            color: color.to_string(),
        }
    }
}

/// One cart line with its add-time snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub original_price: Option<Price>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub size: String,
    pub color: String,
    pub quantity: u32,
}

impl CartLine {
    fn matches(&self, key: &LineKey) -> bool {
        self.product_id == key.product_id && self.size == key.size && self.color == key.color
    }

    /// Identity of this line.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id.clone(), &self.size, &self.color)
    }

    #[must_use]
    pub const fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// What the shopper asked to add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemInput {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub original_price: Option<Price>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub size: String,
    pub color: String,
    /// Defaults to 1.
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl CartItemInput {
    /// Snapshot `product` in the chosen variant.
    #[must_use]
    pub fn from_product(product: &Product, size: &str, color: &str, quantity: Option<u32>) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            original_price: product.original_price,
            image_url: product.image_url.clone(),
            size: size.to_string(),
            color: color.to_string(),
            quantity,
        }
    }

    fn into_line(self, quantity: u32) -> CartLine {
        CartLine {
            product_id: self.product_id,
            name: self.name,
            price: self.price,
            original_price: self.original_price,
            image_url: self.image_url,
            size: self.size,
            color: self.color,
            quantity,
        }
    }
}

/// Cart state for one shopper.
pub struct CartStore {
    lines: Vec<CartLine>,
    total: Price,
    item_count: u32,
    persistence: Arc<dyn LocalStore>,
    key: String,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .field("lines", &self.lines)
            .field("total", &self.total)
            .field("item_count", &self.item_count)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Restore the cart persisted under `key`, verbatim.
    ///
    /// Lines are not checked against the catalog; a line for a product that
    /// has since been removed stays orderable.
    pub fn load(persistence: Arc<dyn LocalStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let lines: Vec<CartLine> = load_json(persistence.as_ref(), &key).unwrap_or_default();
        let mut cart = Self {
            lines,
            total: Price::ZERO,
            item_count: 0,
            persistence,
            key,
        };
        cart.recompute();
        cart
    }

    /// Add a line, or bump the quantity of the line with the same key.
    pub fn add_item(&mut self, input: CartItemInput) {
        let quantity = input.quantity.unwrap_or(1).max(1);
        let key = LineKey::new(input.product_id.clone(), &input.size, &input.color);
        if let Some(line) = self.lines.iter_mut().find(|line| line.matches(&key)) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.lines.push(input.into_line(quantity));
        }
        self.commit();
    }

    /// Remove the line with exactly this key. Returns whether one was removed.
    pub fn remove_item(&mut self, key: &LineKey) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| !line.matches(key));
        let removed = self.lines.len() != before;
        if removed {
            self.commit();
        }
        removed
    }

    /// Set a line's quantity; zero or less removes it.
    ///
    /// Returns whether a line with this key existed.
    pub fn update_quantity(&mut self, key: &LineKey, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(key);
        }
        let Some(line) = self.lines.iter_mut().find(|line| line.matches(key)) else {
            return false;
        };
        line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        self.commit();
        true
    }

    /// Take ordered quantities out of the cart.
    ///
    /// Lines added after the order was taken, and any quantity beyond what
    /// was ordered, stay in the cart.
    pub fn remove_ordered(&mut self, items: &[OrderItem]) {
        for item in items {
            let key = LineKey::new(item.product_id.clone(), &item.size, &item.color);
            if let Some(line) = self.lines.iter_mut().find(|line| line.matches(&key)) {
                line.quantity = line.quantity.saturating_sub(item.quantity);
            }
        }
        self.lines.retain(|line| line.quantity > 0);
        self.commit();
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.commit();
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn contains(&self, key: &LineKey) -> bool {
        self.lines.iter().any(|line| line.matches(key))
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub const fn total(&self) -> Price {
        self.total
    }

    /// Sum of quantities.
    #[must_use]
    pub const fn item_count(&self) -> u32 {
        self.item_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Freeze the lines into order items.
    #[must_use]
    pub fn to_order_items(&self) -> Vec<OrderItem> {
        self.lines
            .iter()
            .map(|line| OrderItem {
                product_id: line.product_id.clone(),
                name: line.name.clone(),
                price: line.price,
                quantity: line.quantity,
                size: line.size.clone(),
                color: line.color.clone(),
            })
            .collect()
    }

    fn recompute(&mut self) {
        self.total = self.lines.iter().map(CartLine::line_total).sum();
        self.item_count = self
            .lines
            .iter()
            .fold(0_u32, |count, line| count.saturating_add(line.quantity));
    }

    fn commit(&mut self) {
        self.recompute();
        save_json(self.persistence.as_ref(), &self.key, &self.lines);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kaay_data::MemoryLocalStore;

    use super::*;

    fn input(id: &str, size: &str, color: &str, price: u64, quantity: Option<u32>) -> CartItemInput {
        CartItemInput {
            product_id: ProductId::new(id),
            name: format!("Produit {id}"),
            price: Price::new(price),
            original_price: None,
            image_url: None,
            size: size.to_string(),
            color: color.to_string(),
            quantity,
        }
    }

    fn cart() -> (Arc<MemoryLocalStore>, CartStore) {
        let persistence = Arc::new(MemoryLocalStore::new());
        let cart = CartStore::load(persistence.clone(), "s1:cart");
        (persistence, cart)
    }

    #[test]
    fn test_same_key_merges_quantities() {
        let (_, mut cart) = cart();
        cart.add_item(input("p1", "M", "Noir", 5000, None));
        cart.add_item(input("p1", "M", "Noir", 5000, Some(3)));
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 4);
        assert_eq!(cart.total(), Price::new(20_000));
        assert_eq!(cart.item_count(), 4);
    }

    #[test]
    fn test_variants_stay_separate() {
        let (_, mut cart) = cart();
        cart.add_item(input("p1", "M", "Noir", 5000, None));
        cart.add_item(input("p1", "L", "Noir", 5000, None));
        cart.add_item(input("p1", "M", "Blanc", 5000, None));
        assert_eq!(cart.lines().len(), 3);

        assert!(cart.remove_item(&LineKey::new("p1", "L", "Noir")));
        assert_eq!(cart.lines().len(), 2);
        assert!(cart.contains(&LineKey::new("p1", "M", "Noir")));
        assert!(cart.contains(&LineKey::new("p1", "M", "Blanc")));
        assert!(!cart.remove_item(&LineKey::new("p1", "XL", "Noir")));
    }

    #[test]
    fn test_remove_ordered_keeps_later_additions() {
        let (persistence, mut cart) = cart();
        cart.add_item(input("p1", "M", "Noir", 5000, Some(2)));
        cart.add_item(input("p2", "M", "", 3000, None));
        let ordered = cart.to_order_items();

        // Added while the order was being written
        cart.add_item(input("p1", "M", "Noir", 5000, None));
        cart.add_item(input("p3", "L", "Blanc", 1000, None));

        cart.remove_ordered(&ordered);
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.lines()[0].quantity, 1);
        assert!(!cart.contains(&LineKey::new("p2", "M", "")));
        assert!(cart.contains(&LineKey::new("p3", "L", "Blanc")));
        assert_eq!(cart.total(), Price::new(6000));

        let reloaded = CartStore::load(persistence, "s1:cart");
        assert_eq!(reloaded.item_count(), 2);
    }

    #[test]
    fn test_update_quantity() {
        let (_, mut cart) = cart();
        let key = LineKey::new("p1", "M", "Noir");
        cart.add_item(input("p1", "M", "Noir", 2500, None));

        assert!(cart.update_quantity(&key, 5));
        assert_eq!(cart.lines()[0].quantity, 5);
        assert_eq!(cart.total(), Price::new(12_500));

        assert!(cart.update_quantity(&key, 0));
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Price::ZERO);

        cart.add_item(input("p1", "M", "Noir", 2500, None));
        assert!(cart.update_quantity(&key, -3));
        assert!(!cart.contains(&key));
        assert!(!cart.update_quantity(&key, 2));
    }

    #[test]
    fn test_clear_resets_totals() {
        let (_, mut cart) = cart();
        cart.add_item(input("p1", "M", "Noir", 5000, Some(2)));
        cart.add_item(input("p2", "L", "Blanc", 3000, None));
        cart.clear();
        assert!(cart.lines().is_empty());
        assert_eq!(cart.total(), Price::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_add_twice_then_remove() {
        let (_, mut cart) = cart();
        let key = LineKey::new("P1", "M", "Noir");
        cart.add_item(input("P1", "M", "Noir", 5000, None));
        cart.add_item(input("P1", "M", "Noir", 5000, None));
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.total(), Price::new(10_000));

        cart.remove_item(&key);
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Price::ZERO);
    }

    #[test]
    fn test_persists_and_restores_verbatim() {
        let (persistence, mut cart) = cart();
        cart.add_item(input("gone", "M", "Noir", 5000, Some(2)));
        drop(cart);

        let restored = CartStore::load(persistence, "s1:cart");
        assert_eq!(restored.lines().len(), 1);
        assert_eq!(restored.total(), Price::new(10_000));
        assert_eq!(restored.item_count(), 2);
    }

    #[test]
    fn test_price_is_snapshotted_at_add_time() {
        let (_, mut cart) = cart();
        cart.add_item(input("p1", "M", "Noir", 5000, None));
        cart.add_item(input("p1", "M", "Noir", 9000, None));
        assert_eq!(cart.lines()[0].price, Price::new(5000));
        assert_eq!(cart.total(), Price::new(10_000));
    }

    #[test]
    fn test_order_items_snapshot() {
        let (_, mut cart) = cart();
        cart.add_item(input("p1", "M", "Noir", 5000, Some(2)));
        let items = cart.to_order_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].line_total(), Price::new(10_000));
    }
}
