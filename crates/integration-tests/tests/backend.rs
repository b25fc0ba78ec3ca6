//! The storefront against a real REST backend, and with none at all.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use kaay_data::{BackendConfig, MemoryLocalStore, connect};
use kaay_integration_tests::{client, json_body, spawn_storefront};
use kaay_storefront::config::StorefrontConfig;
use reqwest::StatusCode;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn storefront_for(backend: BackendConfig) -> String {
    let config = StorefrontConfig {
        backend: backend.clone(),
        ..StorefrontConfig::default()
    };
    spawn_storefront(
        config,
        connect(&backend).unwrap(),
        Arc::new(MemoryLocalStore::new()),
    )
    .await
}

async fn rest_backend(server: &MockServer) -> String {
    let url = Url::parse(&server.uri()).unwrap();
    storefront_for(BackendConfig::new(url, "anon-test-key")).await
}

#[tokio::test]
async fn test_home_served_from_rest_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/categories"))
        .and(header("apikey", "anon-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "c1", "name": "Hoodies", "slug": "hoodies" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "p1", "name": "Hoodie Dakar", "category": "Hoodies",
                "price": 15000, "stock": 3, "is_new": true
            }
        ])))
        .mount(&server)
        .await;

    let base = rest_backend(&server).await;
    let ready = client()
        .get(format!("{base}/health/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::OK);

    let home = json_body(client().get(format!("{base}/api/home")).send().await.unwrap()).await;
    assert_eq!(home["from_fallback"], false);
    assert_eq!(home["products"][0]["name"], "Hoodie Dakar");
    assert_eq!(home["featured"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_home_falls_back_when_backend_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let base = rest_backend(&server).await;
    let home = json_body(client().get(format!("{base}/api/home")).send().await.unwrap()).await;
    assert_eq!(home["from_fallback"], true);
    assert!(!home["products"].as_array().unwrap().is_empty());

    let resp = client()
        .get(format!("{base}/api/categories"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_unconfigured_storefront_still_serves_home() {
    let base = storefront_for(BackendConfig::default()).await;

    let ready = client()
        .get(format!("{base}/health/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);

    let home = json_body(client().get(format!("{base}/api/home")).send().await.unwrap()).await;
    assert_eq!(home["from_fallback"], true);
    assert!(!home["categories"].as_array().unwrap().is_empty());
}
