//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use kaay_core::ShopperId;
use kaay_data::{Backend, LocalStore, Services};
use moka::future::Cache;
use tokio::sync::Mutex;

use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::session::ShopperSession;
use crate::store::{PaymentGateway, PaymentStore};

/// Checkout state is kept for an hour of inactivity.
const PAYMENT_IDLE_SECS: u64 = 60 * 60;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// backend services, the shopper persistence and the payment gateway.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    services: Services,
    catalog: Catalog,
    persistence: Arc<dyn LocalStore>,
    gateway: Arc<dyn PaymentGateway>,
    payments: Cache<ShopperId, Arc<Mutex<PaymentStore>>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        backend: Arc<dyn Backend>,
        persistence: Arc<dyn LocalStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let services = Services::new(backend);
        let catalog = Catalog::new(services.clone(), config.home_timeout);
        let payments = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(Duration::from_secs(PAYMENT_IDLE_SECS))
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                services,
                catalog,
                persistence,
                gateway,
                payments,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the entity services.
    #[must_use]
    pub fn services(&self) -> &Services {
        &self.inner.services
    }

    /// Get a reference to the cached catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a reference to the payment gateway.
    #[must_use]
    pub fn gateway(&self) -> &dyn PaymentGateway {
        self.inner.gateway.as_ref()
    }

    /// Whether a remote backend is configured.
    #[must_use]
    pub fn backend_configured(&self) -> bool {
        self.inner.config.backend.is_configured()
    }

    /// Restore a shopper's cart, favorites and profile.
    #[must_use]
    pub fn open_session(&self, shopper: ShopperId) -> ShopperSession {
        ShopperSession::open(Arc::clone(&self.inner.persistence), shopper)
    }

    /// The shopper's checkout state, created on first use.
    pub async fn payment(&self, shopper: &ShopperId) -> Arc<Mutex<PaymentStore>> {
        self.inner
            .payments
            .get_with(shopper.clone(), async {
                Arc::new(Mutex::new(PaymentStore::new()))
            })
            .await
    }
}
