//! Application state shared across handlers.

use std::sync::Arc;

use kaay_data::{Backend, LocalStore, Services};

use crate::config::AdminConfig;
use crate::store::AdminStore;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Each request builds its own [`AdminStore`]
/// over the shared services, so no back-office list outlives a request.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    services: Services,
    persistence: Arc<dyn LocalStore>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: AdminConfig,
        backend: Arc<dyn Backend>,
        persistence: Arc<dyn LocalStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                services: Services::new(backend),
                persistence,
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the local snapshot store.
    #[must_use]
    pub fn persistence(&self) -> &dyn LocalStore {
        self.inner.persistence.as_ref()
    }

    /// A fresh, empty back-office store.
    #[must_use]
    pub fn store(&self) -> AdminStore {
        AdminStore::new(
            self.inner.services.clone(),
            Arc::clone(&self.inner.persistence),
        )
    }

    /// Whether a remote backend is configured.
    #[must_use]
    pub fn backend_configured(&self) -> bool {
        self.inner.config.backend.is_configured()
    }
}
