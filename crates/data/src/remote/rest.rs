//! PostgREST adapter over `reqwest`.
//!
//! Tables live under `<base>/rest/v1/<table>`, server-side functions under
//! `<base>/rest/v1/rpc/<name>`. Every request carries the API key both as
//! the `apikey` header and as a bearer token.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::query::filter_params;
use super::{Backend, Filter, Query, Table};
use crate::error::BackendError;

/// Longest response-body excerpt kept in errors and logs.
const BODY_EXCERPT: usize = 500;

/// REST backend client.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct RestBackend {
    inner: Arc<RestBackendInner>,
}

struct RestBackendInner {
    client: reqwest::Client,
    base: Url,
    anon_key: SecretString,
}

impl std::fmt::Debug for RestBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestBackend")
            .field("base", &self.inner.base.as_str())
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

impl RestBackend {
    /// Create a client for the backend at `base`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn new(
        mut base: Url,
        anon_key: &SecretString,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        // `Url::join` drops the last path segment unless it ends with a slash
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner: Arc::new(RestBackendInner {
                client,
                base,
                anon_key: anon_key.clone(),
            }),
        })
    }

    fn endpoint(&self, path: &str, params: &[(String, String)]) -> Result<Url, BackendError> {
        let mut url = self.inner.base.join(&format!("rest/v1/{path}"))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let key = self.inner.anon_key.expose_secret();
        self.inner
            .client
            .request(method, url)
            .header("apikey", key)
            .bearer_auth(key)
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
    }

    /// Send a request and decode the JSON body.
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Value, BackendError> {
        let response = builder.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;
        let excerpt: String = body.chars().take(BODY_EXCERPT).collect();

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %excerpt,
                "Backend returned non-success status"
            );
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: excerpt,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Array(Vec::new()));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, body = %excerpt, "Failed to parse backend response");
            BackendError::Parse(e)
        })
    }

    async fn send_rows(&self, builder: reqwest::RequestBuilder) -> Result<Vec<Value>, BackendError> {
        match self.send(builder).await? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            single => Ok(vec![single]),
        }
    }
}

#[async_trait]
impl Backend for RestBackend {
    #[instrument(skip(self, query), fields(table = %query.table))]
    async fn select(&self, query: &Query) -> Result<Vec<Value>, BackendError> {
        let url = self.endpoint(query.table.as_str(), &query.to_params())?;
        let rows = self.send_rows(self.request(reqwest::Method::GET, url)).await?;
        debug!(rows = rows.len(), "Selected rows");
        Ok(rows)
    }

    #[instrument(skip(self, rows), fields(table = %table, count = rows.len()))]
    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>, BackendError> {
        let url = self.endpoint(table.as_str(), &[])?;
        let builder = self
            .request(reqwest::Method::POST, url)
            .json(&Value::Array(rows));
        self.send_rows(builder).await
    }

    #[instrument(skip(self, filters, patch), fields(table = %table))]
    async fn update(
        &self,
        table: Table,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, BackendError> {
        let url = self.endpoint(table.as_str(), &filter_params(filters))?;
        let builder = self.request(reqwest::Method::PATCH, url).json(&patch);
        self.send_rows(builder).await
    }

    #[instrument(skip(self, filters), fields(table = %table))]
    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<usize, BackendError> {
        let url = self.endpoint(table.as_str(), &filter_params(filters))?;
        let rows = self
            .send_rows(self.request(reqwest::Method::DELETE, url))
            .await?;
        Ok(rows.len())
    }

    #[instrument(skip(self, args))]
    async fn rpc(&self, function: &str, args: Value) -> Result<Value, BackendError> {
        let url = self.endpoint(&format!("rpc/{function}"), &[])?;
        let builder = self.request(reqwest::Method::POST, url).json(&args);
        match self.send(builder).await {
            Err(BackendError::Status { status: 404, .. }) => {
                Err(BackendError::UnknownFunction(function.to_string()))
            }
            other => other,
        }
    }
}
