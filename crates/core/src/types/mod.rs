//! Core types for Kaay.
//!
//! This module provides type-safe wrappers for common domain concepts and
//! the entity shapes exchanged with the backend.

pub mod category;
pub mod id;
pub mod order;
pub mod phone;
pub mod premium;
pub mod price;
pub mod product;
pub mod status;

pub use category::{Category, CategoryPatch, NewCategory};
pub use id::*;
pub use order::{BuyerInfo, NewOrder, Order, OrderItem};
pub use phone::{Phone, PhoneError};
pub use premium::{NewPremiumRequest, PremiumRequest, PremiumRequestPatch};
pub use price::Price;
pub use product::{NewProduct, Product, ProductPatch};
pub use status::*;
