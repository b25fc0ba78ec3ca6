//! Dashboard aggregates, recomputed from the full order and product lists.

use std::collections::{HashMap, HashSet};

use kaay_core::{Order, OrderStatus, Price, Product, ProductId};
use serde::Serialize;

/// Products with fewer units than this are low on stock.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

/// Distinct customers who ordered for delivery to one city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityCustomers {
    pub city: String,
    pub customers: usize,
}

/// Number of orders in one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: usize,
}

/// A product below [`LOW_STOCK_THRESHOLD`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockProduct {
    pub id: ProductId,
    pub name: String,
    pub stock: u32,
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_orders: usize,
    /// Sum of totals over paid, shipped and delivered orders.
    pub total_revenue: Price,
    /// Revenue divided by the number of revenue orders, rounded down.
    pub average_order_value: Price,
    /// Distinct phone numbers across all orders.
    pub total_customers: usize,
    /// Most customers first, then by city name.
    pub customers_by_city: Vec<CityCustomers>,
    /// One entry per status, lifecycle order.
    pub orders_by_status: Vec<StatusCount>,
    pub total_products: usize,
    pub low_stock_count: usize,
    /// Lowest stock first.
    pub low_stock_products: Vec<LowStockProduct>,
}

impl DashboardStats {
    /// Compute every aggregate in one pass over each list.
    #[must_use]
    pub fn compute(orders: &[Order], products: &[Product]) -> Self {
        let mut revenue = 0_u64;
        let mut revenue_orders = 0_u64;
        let mut customers = HashSet::new();
        let mut by_city: HashMap<&str, HashSet<String>> = HashMap::new();
        let mut by_status: HashMap<OrderStatus, usize> = HashMap::new();

        for order in orders {
            if order.status.counts_as_revenue() {
                revenue = revenue.saturating_add(order.total.amount());
                revenue_orders += 1;
            }
            *by_status.entry(order.status).or_default() += 1;

            let customer = customer_key(&order.buyer.phone);
            let city = order.city.trim();
            if !city.is_empty() {
                by_city.entry(city).or_default().insert(customer.clone());
            }
            customers.insert(customer);
        }

        let mut customers_by_city: Vec<CityCustomers> = by_city
            .into_iter()
            .map(|(city, phones)| CityCustomers {
                city: city.to_string(),
                customers: phones.len(),
            })
            .collect();
        customers_by_city.sort_by(|a, b| {
            b.customers
                .cmp(&a.customers)
                .then_with(|| a.city.cmp(&b.city))
        });

        let orders_by_status = OrderStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status,
                count: by_status.get(&status).copied().unwrap_or(0),
            })
            .collect();

        let mut low_stock_products: Vec<LowStockProduct> = products
            .iter()
            .filter(|p| p.stock < LOW_STOCK_THRESHOLD)
            .map(|p| LowStockProduct {
                id: p.id.clone(),
                name: p.name.clone(),
                stock: p.stock,
            })
            .collect();
        low_stock_products.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.name.cmp(&b.name)));

        Self {
            total_orders: orders.len(),
            total_revenue: Price::new(revenue),
            average_order_value: Price::new(revenue.checked_div(revenue_orders).unwrap_or(0)),
            total_customers: customers.len(),
            customers_by_city,
            orders_by_status,
            total_products: products.len(),
            low_stock_count: low_stock_products.len(),
            low_stock_products,
        }
    }
}

/// Customers are identified by the digits of their phone number.
fn customer_key(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}
