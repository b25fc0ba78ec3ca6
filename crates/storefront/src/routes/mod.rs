//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (backend configured)
//!
//! # Catalog
//! GET  /api/home               - Home listing (sample data on timeout)
//! GET  /api/categories         - Active categories
//! GET  /api/products           - Filtered, sorted listing
//! GET  /api/products/search    - Type-ahead search
//! GET  /api/products/{id}      - Product detail with related products
//!
//! # Shopper (cookie session)
//! GET  /api/cart               - Cart
//! POST /api/cart/add           - Add a variant
//! POST /api/cart/update        - Set a line's quantity
//! POST /api/cart/remove        - Remove a line
//! POST /api/cart/clear         - Empty the cart
//! GET  /api/favorites          - Favorites
//! POST /api/favorites/toggle   - Toggle a favorite
//! GET  /api/profile            - Saved buyer details
//! PUT  /api/profile            - Save buyer details
//!
//! # Orders
//! POST /api/checkout           - Pay and record the order
//! GET  /api/orders/{id}        - Order confirmation
//! GET  /api/orders?phone=      - Orders by phone
//!
//! # Premium
//! POST /api/premium-requests   - Submit a premium request
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod premium;
pub mod shopper;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::list))
        .route("/search", get(catalog::search))
        .route("/{id}", get(catalog::show))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/home", get(catalog::home))
        .route("/categories", get(catalog::categories))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/favorites", get(shopper::favorites))
        .route("/favorites/toggle", post(shopper::toggle_favorite))
        .route("/profile", get(shopper::profile).put(shopper::save_profile))
        .route("/checkout", post(checkout::checkout))
        .route("/orders", get(checkout::orders_by_phone))
        .route("/orders/{id}", get(checkout::order))
        .route("/premium-requests", post(premium::submit))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 when no backend is configured: the storefront is up but can
/// only serve sample data.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.backend_configured() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request, header};
    use kaay_core::{OrderId, PaymentMethod, Phone, Price};
    use kaay_data::{MemoryBackend, MemoryLocalStore, Table};
    use serde_json::{Value, json};
    use tokio::sync::Notify;
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::store::{PaymentGateway, Settlement, SimulatedGateway};

    fn app_with(backend: Arc<MemoryBackend>) -> Router {
        app_with_gateway(backend, Arc::new(SimulatedGateway))
    }

    fn app_with_gateway(backend: Arc<MemoryBackend>, gateway: Arc<dyn PaymentGateway>) -> Router {
        let state = AppState::new(
            StorefrontConfig::default(),
            backend,
            Arc::new(MemoryLocalStore::new()),
            gateway,
        );
        crate::app(state)
    }

    fn seeded() -> Arc<MemoryBackend> {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed(
            Table::Products,
            &[
                json!({
                    "id": "p1", "name": "Hoodie Dakar", "category": "Hoodies",
                    "price": 15000, "stock": 5, "sizes": ["M", "L"], "colors": ["Noir"],
                    "is_active": true
                }),
                json!({
                    "id": "p2", "name": "Tee Teranga", "category": "T-shirts",
                    "price": 5000, "stock": 5, "sizes": ["M"], "colors": [],
                    "is_active": true
                }),
            ],
        );
        backend
    }

    /// Send a request, returning status, session cookie (if set) and JSON body.
    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(String::from);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, cookie, body)
    }

    #[tokio::test]
    async fn test_health_and_readiness() {
        let app = app_with(seeded());
        let (status, _, _) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);

        // Default config has no backend credentials
        let (status, _, _) = send(&app, Method::GET, "/health/ready", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_cart_follows_session_cookie() {
        let app = app_with(seeded());
        let add = json!({ "product_id": "p1", "size": "M", "color": "Noir", "quantity": 2 });

        let (status, cookie, body) =
            send(&app, Method::POST, "/api/cart/add", None, Some(add.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 30000);
        let cookie = cookie.unwrap();
        assert!(cookie.starts_with("kaay_session="));

        let (_, _, body) = send(&app, Method::GET, "/api/cart", Some(&cookie), None).await;
        assert_eq!(body["item_count"], 2);

        // A new visitor gets an empty cart
        let (_, _, body) = send(&app, Method::GET, "/api/cart", None, None).await;
        assert_eq!(body["item_count"], 0);
    }

    #[tokio::test]
    async fn test_cart_rejects_unknown_variant_and_product() {
        let app = app_with(seeded());

        let (status, _, _) = send(
            &app,
            Method::POST,
            "/api/cart/add",
            None,
            Some(json!({ "product_id": "p1", "size": "XXL", "color": "Noir" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = send(
            &app,
            Method::POST,
            "/api/cart/add",
            None,
            Some(json!({ "product_id": "nope", "size": "M", "color": "Noir" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_to_zero_removes_line() {
        let app = app_with(seeded());
        let (_, cookie, _) = send(
            &app,
            Method::POST,
            "/api/cart/add",
            None,
            Some(json!({ "product_id": "p2", "size": "M", "color": "" })),
        )
        .await;
        let cookie = cookie.unwrap();

        let (status, _, body) = send(
            &app,
            Method::POST,
            "/api/cart/update",
            Some(&cookie),
            Some(json!({ "product_id": "p2", "size": "M", "color": "", "quantity": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["lines"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_product_listing_sorted_by_price() {
        let app = app_with(seeded());
        let (status, _, body) = send(
            &app,
            Method::GET,
            "/api/products?sort=price&dir=asc",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["products"][0]["id"], "p2");
    }

    #[tokio::test]
    async fn test_search_reaches_backend() {
        let backend = seeded();
        let app = app_with(backend.clone());
        let (_, _, body) = send(&app, Method::GET, "/api/products", None, None).await;
        assert_eq!(body["count"], 2);

        // Added after the catalog was cached
        backend.seed(
            Table::Products,
            &[
                json!({
                    "id": "p3", "name": "Casquette Dakar", "category": "Casquettes",
                    "price": 4000, "stock": 5, "sizes": ["Unique"], "colors": [],
                    "is_active": true
                }),
                json!({
                    "id": "p4", "name": "Dakar Retro", "category": "Hoodies",
                    "price": 9000, "stock": 5, "sizes": ["M"], "colors": [],
                    "is_active": false
                }),
            ],
        );

        let (status, _, body) =
            send(&app, Method::GET, "/api/products/search?q=dakar", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Casquette Dakar", "Hoodie Dakar"]);
    }

    #[tokio::test]
    async fn test_search_uses_cache_when_backend_down() {
        let backend = seeded();
        let app = app_with(backend.clone());
        send(&app, Method::GET, "/api/products", None, None).await;
        backend.fail_table(Table::Products);

        let (status, _, body) =
            send(&app, Method::GET, "/api/products/search?q=dakar", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], "p1");
    }

    #[tokio::test]
    async fn test_favorites_toggle() {
        let app = app_with(seeded());
        let toggle = json!({ "product_id": "p1" });

        let (_, cookie, body) =
            send(&app, Method::POST, "/api/favorites/toggle", None, Some(toggle.clone())).await;
        assert_eq!(body["favorite"], true);
        let cookie = cookie.unwrap();

        let (_, _, body) = send(&app, Method::GET, "/api/favorites", Some(&cookie), None).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["products"][0]["name"], "Hoodie Dakar");

        let (_, _, body) =
            send(&app, Method::POST, "/api/favorites/toggle", Some(&cookie), Some(toggle)).await;
        assert_eq!(body["favorite"], false);
    }

    #[tokio::test]
    async fn test_profile_validation() {
        let app = app_with(seeded());
        let (status, _, body) = send(
            &app,
            Method::PUT,
            "/api/profile",
            None,
            Some(json!({ "name": "Awa", "phone": "12", "address": "Rue 10", "city": "Dakar" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["fields"]["phone"].is_string());
    }

    #[tokio::test]
    async fn test_security_headers_on_api() {
        let app = app_with(seeded());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/categories")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert!(response.headers().contains_key("x-request-id"));
    }

    /// Never answers the first payment; approves every later one.
    #[derive(Default)]
    struct HangsOnceGateway {
        hung: AtomicBool,
    }

    #[async_trait]
    impl PaymentGateway for HangsOnceGateway {
        async fn settle(&self, _: &OrderId, _: PaymentMethod, _: Price, _: &Phone) -> Settlement {
            if !self.hung.swap(true, Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            Settlement::Approved
        }
    }

    /// Holds each payment until released.
    #[derive(Default)]
    struct GatedGateway {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl PaymentGateway for GatedGateway {
        async fn settle(&self, _: &OrderId, _: PaymentMethod, _: Price, _: &Phone) -> Settlement {
            self.entered.notify_one();
            self.release.notified().await;
            Settlement::Approved
        }
    }

    fn checkout_form() -> Value {
        json!({
            "payment_method": "free",
            "name": "Awa Diop",
            "phone": "771234567",
            "address": "Rue 10, Medina",
            "city": "Dakar",
            "amount": 10000,
        })
    }

    async fn cart_with_two_tees(app: &Router) -> String {
        let (status, cookie, _) = send(
            app,
            Method::POST,
            "/api/cart/add",
            None,
            Some(json!({ "product_id": "p2", "size": "M", "color": "", "quantity": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        cookie.unwrap()
    }

    #[tokio::test]
    async fn test_checkout_retry_after_dropped_request() {
        let backend = seeded();
        let app = app_with_gateway(backend.clone(), Arc::new(HangsOnceGateway::default()));
        let cookie = cart_with_two_tees(&app).await;

        // The client goes away while the gateway is settling
        let dropped = tokio::time::timeout(
            Duration::from_millis(50),
            send(&app, Method::POST, "/api/checkout", Some(&cookie), Some(checkout_form())),
        )
        .await;
        assert!(dropped.is_err());

        let (status, _, body) = send(
            &app,
            Method::POST,
            "/api/checkout",
            Some(&cookie),
            Some(checkout_form()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "success");
        assert_eq!(backend.calls(Table::Orders).inserts, 1);
    }

    #[tokio::test]
    async fn test_checkout_keeps_lines_added_meanwhile() {
        let backend = seeded();
        let gateway = Arc::new(GatedGateway::default());
        let app = app_with_gateway(backend, gateway.clone());
        let cookie = cart_with_two_tees(&app).await;

        let pending = {
            let app = app.clone();
            let cookie = cookie.clone();
            tokio::spawn(async move {
                send(&app, Method::POST, "/api/checkout", Some(&cookie), Some(checkout_form()))
                    .await
            })
        };
        gateway.entered.notified().await;

        let (status, _, _) = send(
            &app,
            Method::POST,
            "/api/cart/add",
            Some(&cookie),
            Some(json!({ "product_id": "p1", "size": "L", "color": "Noir" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        gateway.release.notify_one();

        let (status, _, _) = pending.await.unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let (_, _, cart) = send(&app, Method::GET, "/api/cart", Some(&cookie), None).await;
        assert_eq!(cart["item_count"], 1);
        assert_eq!(cart["lines"][0]["product_id"], "p1");
        assert_eq!(cart["total"], 15000);
    }
}
