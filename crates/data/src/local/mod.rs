//! Local key/value persistence for per-shopper and back-office snapshots.
//!
//! Values are strings, normally JSON. Persistence is best-effort: the typed
//! helpers [`load_json`] and [`save_json`] log failures and carry on, so a
//! broken disk never changes what a store holds in memory.

mod file;
mod memory;

use kaay_core::ShopperId;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

pub use file::FileLocalStore;
pub use memory::MemoryLocalStore;

/// Errors raised by a [`LocalStore`].
#[derive(Debug, Error)]
pub enum LocalStoreError {
    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The key cannot be mapped to a storage location.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// Synchronous string key/value store.
pub trait LocalStore: Send + Sync {
    /// Read a value, `None` if the key was never written.
    ///
    /// # Errors
    ///
    /// Returns `LocalStoreError` if the underlying storage fails.
    fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `LocalStoreError` if the underlying storage fails.
    fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError>;

    /// Delete a key. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `LocalStoreError` if the underlying storage fails.
    fn remove(&self, key: &str) -> Result<(), LocalStoreError>;
}

/// Well-known keys.
pub mod keys {
    use kaay_core::ShopperId;

    pub const CART: &str = "cart";
    pub const FAVORITES: &str = "favorites";
    /// Saved buyer profile.
    pub const USER: &str = "user";
    pub const ADMIN_SESSION: &str = "admin_session";
    pub const PREMIUM_REQUESTS: &str = "premium_requests";

    /// Scope `key` to one shopper: `<shopper>:<key>`.
    #[must_use]
    pub fn namespaced(shopper: &ShopperId, key: &str) -> String {
        format!("{shopper}:{key}")
    }
}

/// Read and decode a JSON value.
///
/// Missing keys, storage failures and undecodable values all yield `None`;
/// the latter two are logged.
pub fn load_json<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            warn!(key, error = %e, "Failed to read local value");
            return None;
        }
    };
    serde_json::from_str(&raw)
        .inspect_err(|e| warn!(key, error = %e, "Discarding undecodable local value"))
        .ok()
}

/// Encode and write a JSON value, logging any failure.
pub fn save_json<T: Serialize + ?Sized>(store: &dyn LocalStore, key: &str, value: &T) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(key, error = %e, "Failed to encode local value");
            return;
        }
    };
    if let Err(e) = store.set(key, &raw) {
        warn!(key, error = %e, "Failed to write local value");
    }
}

/// Delete a key, logging any failure.
pub fn forget(store: &dyn LocalStore, key: &str) {
    if let Err(e) = store.remove(key) {
        warn!(key, error = %e, "Failed to remove local value");
    }
}

/// Delete every per-shopper key for `shopper`.
pub fn forget_shopper(store: &dyn LocalStore, shopper: &ShopperId) {
    for key in [keys::CART, keys::FAVORITES, keys::USER] {
        forget(store, &keys::namespaced(shopper, key));
    }
}
