//! Per-shopper and catalog state.
//!
//! Stores are plain owned structs mutated through `&mut self`. Handlers build
//! them per request from the persisted snapshot and the shared services.

pub mod cart;
pub mod favorites;
pub mod payment;
pub mod products;

pub use cart::{CartItemInput, CartLine, CartStore, LineKey};
pub use favorites::FavoritesStore;
pub use payment::{
    CheckoutRequest, PaymentError, PaymentGateway, PaymentStatus, PaymentStore, Settlement,
    SimulatedGateway,
};
pub use products::{
    CategoryFilter, ProductQuery, ProductStore, SearchMode, SortDirection, SortKey,
    TYPE_AHEAD_LIMIT,
};
