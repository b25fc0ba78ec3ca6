//! Kaay Data - backend access and local persistence.
//!
//! # Architecture
//!
//! ```text
//! stores (storefront / admin)
//!     │
//!     ├── services::{ProductService, CategoryService, OrderService, PremiumRequestService}
//!     │       │  typed, one round-trip per call, failures logged and returned
//!     │       ▼
//!     │   remote::Backend  ── RestBackend (PostgREST over reqwest)
//!     │                    ── MemoryBackend (tests, local development)
//!     │                    ── UnconfiguredBackend (no credentials: every call fails)
//!     │
//!     └── local::LocalStore ── FileLocalStore (one JSON file per key)
//!                           ── MemoryLocalStore (tests)
//! ```
//!
//! The backend schema is owned elsewhere; this crate only knows table names,
//! column names, and the row shapes in `kaay_core`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod local;
pub mod remote;
pub mod services;

pub use config::BackendConfig;
pub use error::{BackendError, DataError};
pub use local::{FileLocalStore, LocalStore, LocalStoreError, MemoryLocalStore, keys};
pub use remote::{
    Backend, CallCounts, MemoryBackend, RestBackend, Table, UnconfiguredBackend, connect,
};
pub use services::{
    CategoryService, CategoryStat, OrderService, PopularProduct, PremiumRequestService,
    ProductService, Services,
};
