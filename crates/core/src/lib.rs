//! Kaay Core - Shared types library.
//!
//! This crate provides common types used across all Kaay components:
//! - `data` - Remote backend access and local persistence
//! - `storefront` - Public-facing shop (catalog, cart, checkout)
//! - `admin` - Back-office (products, categories, orders, premium requests)
//!
//! # Architecture
//!
//! The core crate contains only types, write DTOs and pure validation
//! functions - no I/O, no backend access, no HTTP clients. This keeps it
//! lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, phone numbers, statuses and entities
//! - [`validation`] - Form validation shared by the storefront and admin

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod validation;

pub use types::*;
