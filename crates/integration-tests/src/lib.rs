//! End-to-end tests for Kaay.
//!
//! Both binaries' routers are served on ephemeral ports over one shared
//! backend, and driven with real HTTP clients that keep their cookies. No
//! external services are needed: the backend is an in-memory table store,
//! or a `wiremock` server when the REST client itself is under test.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kaay-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;

use argon2::Argon2;
use argon2::password_hash::{PasswordHasher, SaltString};
use kaay_admin::config::AdminConfig;
use kaay_data::{Backend, FileLocalStore, LocalStore, MemoryBackend, MemoryLocalStore, Table};
use kaay_storefront::config::StorefrontConfig;
use kaay_storefront::store::SimulatedGateway;
use reqwest::Client;
use secrecy::SecretString;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Back-office login used by every test.
pub const ADMIN_EMAIL: &str = "admin@kaay.sn";
pub const ADMIN_PASSWORD: &str = "teranga-2024";

/// Both applications running over one backend.
pub struct TestContext {
    pub backend: Arc<MemoryBackend>,
    pub storefront_url: String,
    pub admin_url: String,
    /// Snapshots written by the admin (login, premium requests).
    pub admin_snapshots: Arc<MemoryLocalStore>,
    _shopper_dir: TempDir,
}

impl TestContext {
    /// Start both applications over a backend seeded with [`seed_catalog`].
    pub async fn start() -> Self {
        let backend = Arc::new(MemoryBackend::new());
        seed_catalog(&backend);

        let shopper_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let shoppers =
            FileLocalStore::open(shopper_dir.path()).expect("Failed to open shopper store");
        let storefront_url = spawn_storefront(
            StorefrontConfig::default(),
            Arc::clone(&backend) as Arc<dyn Backend>,
            Arc::new(shoppers),
        )
        .await;

        let admin_snapshots = Arc::new(MemoryLocalStore::new());
        let admin_url = spawn_admin(
            Arc::clone(&backend) as Arc<dyn Backend>,
            Arc::clone(&admin_snapshots) as Arc<dyn LocalStore>,
        )
        .await;

        Self {
            backend,
            storefront_url,
            admin_url,
            admin_snapshots,
            _shopper_dir: shopper_dir,
        }
    }

    /// Storefront URL for `path`.
    #[must_use]
    pub fn storefront(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    /// Admin URL for `path`.
    #[must_use]
    pub fn admin(&self, path: &str) -> String {
        format!("{}{path}", self.admin_url)
    }

    /// An admin client that is already logged in.
    pub async fn admin_client(&self) -> Client {
        let client = client();
        let resp = client
            .post(self.admin("/auth/login"))
            .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
            .send()
            .await
            .expect("Failed to log in");
        assert!(resp.status().is_success(), "login failed: {}", resp.status());
        client
    }
}

/// An HTTP client that keeps cookies, like a browser.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Two active products and one category.
///
/// - `p1`: Hoodie Dakar, 15 000 FCFA, sizes M and L, black, 3 in stock
/// - `p2`: Tee Teranga, 5 000 FCFA, size M, any color, 40 in stock
pub fn seed_catalog(backend: &MemoryBackend) {
    backend.seed(
        Table::Categories,
        &[json!({
            "id": "c1", "name": "Hoodies", "slug": "hoodies",
            "sort_order": 0, "is_active": true
        })],
    );
    backend.seed(
        Table::Products,
        &[
            json!({
                "id": "p1", "name": "Hoodie Dakar", "category": "Hoodies",
                "price": 15000, "stock": 3, "sizes": ["M", "L"], "colors": ["Noir"],
                "is_active": true, "is_new": true
            }),
            json!({
                "id": "p2", "name": "Tee Teranga", "category": "T-shirts",
                "price": 5000, "stock": 40, "sizes": ["M"], "colors": [],
                "is_active": true
            }),
        ],
    );
}

/// Serve the storefront on an ephemeral port, returning its base URL.
pub async fn spawn_storefront(
    config: StorefrontConfig,
    backend: Arc<dyn Backend>,
    shoppers: Arc<dyn LocalStore>,
) -> String {
    let state = kaay_storefront::state::AppState::new(
        config,
        backend,
        shoppers,
        Arc::new(SimulatedGateway),
    );
    serve(kaay_storefront::app(state)).await
}

/// Serve the admin on an ephemeral port, returning its base URL.
pub async fn spawn_admin(backend: Arc<dyn Backend>, snapshots: Arc<dyn LocalStore>) -> String {
    let state = kaay_admin::state::AppState::new(admin_config(), backend, snapshots);
    serve(kaay_admin::app(state)).await
}

fn admin_config() -> AdminConfig {
    let salt = SaltString::encode_b64(b"kaaysaltkaaysalt").expect("Invalid salt");
    let hash = Argon2::default()
        .hash_password(ADMIN_PASSWORD.as_bytes(), &salt)
        .expect("Failed to hash password")
        .to_string();
    AdminConfig::new(ADMIN_EMAIL, SecretString::from(hash)).expect("Invalid admin config")
}

async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });
    format!("http://{addr}")
}

/// Decode a response body as JSON, `Null` when empty.
pub async fn json_body(resp: reqwest::Response) -> Value {
    let bytes = resp.bytes().await.expect("Failed to read body");
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}
