//! Pinecone index service over the REST API.
//!
//! Provides [`PineconeClient`] (control plane: describe and create indexes)
//! and [`PineconeIndex`] (data plane: upsert and query), both built on
//! `reqwest`.
//!
//! This module is only available when the `pinecone` feature is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use adk_ingest::pinecone::PineconeClient;
//!
//! let client = PineconeClient::new(std::env::var("PINECONE_API_KEY")?)?;
//! let index = client.open_index("https://rag-768-abc123.svc.pinecone.io")?;
//! index.upsert(&records, "docs").await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::document::Record;
use crate::error::{IngestError, Result};
use crate::index::{CreateIndexRequest, IndexHandle, IndexService, QueryRequest, QueryResponse};

/// The Pinecone control-plane endpoint.
pub const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";

/// API version sent with every request. Index tags need 2024-10 or later.
pub const API_VERSION: &str = "2025-01";

const BACKEND: &str = "pinecone";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(300);

fn index_error(message: impl Into<String>) -> IngestError {
    IngestError::IndexError { backend: BACKEND.to_string(), message: message.into() }
}

/// Prefix `https://` to hosts given without a scheme.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

// ── Pinecone API request/response types ────────────────────────────

#[derive(Debug, Deserialize)]
struct IndexModel {
    name: String,
    #[serde(default)]
    host: String,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    state: String,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [Record],
    namespace: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Turn a failed response into an [`IngestError::IndexError`].
async fn api_error(context: &str, response: reqwest::Response) -> IngestError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail =
        serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);
    error!(backend = BACKEND, %status, context, "API error");
    index_error(format!("{context}: API returned {status}: {detail}"))
}

fn request_error(context: &str, e: reqwest::Error) -> IngestError {
    error!(backend = BACKEND, error = %e, context, "request failed");
    index_error(format!("{context}: request failed: {e}"))
}

/// Control-plane client for Pinecone.
///
/// Cloning is cheap; the underlying HTTP client is shared.
#[derive(Clone)]
pub struct PineconeClient {
    client: reqwest::Client,
    api_key: String,
    control_plane_url: String,
    poll_interval: Duration,
    ready_timeout: Duration,
}

impl PineconeClient {
    /// Create a client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(IngestError::ConfigError("Pinecone API key must not be empty".into()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            control_plane_url: CONTROL_PLANE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            ready_timeout: DEFAULT_READY_TIMEOUT,
        })
    }

    /// Create a client using the `PINECONE_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("PINECONE_API_KEY")
            .map_err(|_| IngestError::ConfigError("Pinecone API key not set".into()))?;
        Self::new(api_key)
    }

    /// Override the control-plane URL.
    pub fn with_control_plane_url(mut self, url: impl Into<String>) -> Self {
        self.control_plane_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// How often to check whether a newly created index is ready.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// How long to wait for a newly created index to become ready.
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    fn index_url(&self, name: &str) -> String {
        format!("{}/indexes/{name}", self.control_plane_url)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    /// Describe an index; `None` when it does not exist.
    async fn describe(&self, name: &str) -> Result<Option<IndexModel>> {
        let context = "describe index";
        let response =
            self.get(&self.index_url(name)).send().await.map_err(|e| request_error(context, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(api_error(context, response).await);
        }
        let model = response.json().await.map_err(|e| request_error(context, e))?;
        Ok(Some(model))
    }

    /// Poll until the index reports ready.
    async fn wait_until_ready(&self, mut model: IndexModel) -> Result<IndexModel> {
        let deadline = tokio::time::Instant::now() + self.ready_timeout;
        while !model.status.ready {
            if tokio::time::Instant::now() >= deadline {
                return Err(index_error(format!(
                    "index '{}' not ready after {:?} (state: {})",
                    model.name, self.ready_timeout, model.status.state
                )));
            }
            debug!(index = %model.name, state = %model.status.state, "waiting for index");
            tokio::time::sleep(self.poll_interval).await;
            model = self
                .describe(&model.name)
                .await?
                .ok_or_else(|| index_error(format!("index '{}' disappeared", model.name)))?;
        }
        Ok(model)
    }

    fn handle(&self, host: &str) -> PineconeIndex {
        PineconeIndex {
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            host: normalize_host(host),
        }
    }
}

impl std::fmt::Debug for PineconeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeClient")
            .field("control_plane_url", &self.control_plane_url)
            .field("poll_interval", &self.poll_interval)
            .field("ready_timeout", &self.ready_timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IndexService for PineconeClient {
    async fn has_index(&self, name: &str) -> Result<bool> {
        Ok(self.describe(name).await?.is_some())
    }

    async fn create_index(&self, request: &CreateIndexRequest) -> Result<Arc<dyn IndexHandle>> {
        let context = "create index";
        let response = self
            .client
            .post(format!("{}/indexes", self.control_plane_url))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(request)
            .send()
            .await
            .map_err(|e| request_error(context, e))?;

        if response.status() == StatusCode::CONFLICT {
            return Err(IngestError::IndexAlreadyExistsError { index: request.name.clone() });
        }
        if !response.status().is_success() {
            return Err(api_error(context, response).await);
        }

        let model: IndexModel = response.json().await.map_err(|e| request_error(context, e))?;
        let model = self.wait_until_ready(model).await?;
        info!(index = %model.name, host = %model.host, "index ready");

        let handle: Arc<dyn IndexHandle> = Arc::new(self.handle(&model.host));
        Ok(handle)
    }

    fn open_index(&self, host: &str) -> Result<Arc<dyn IndexHandle>> {
        if host.trim().is_empty() {
            return Err(IngestError::ConfigError("index host must not be empty".into()));
        }
        let handle: Arc<dyn IndexHandle> = Arc::new(self.handle(host));
        Ok(handle)
    }
}

/// Data-plane handle bound to one Pinecone index host.
#[derive(Clone)]
pub struct PineconeIndex {
    client: reqwest::Client,
    api_key: String,
    host: String,
}

impl PineconeIndex {
    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{path}", self.host))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }
}

impl std::fmt::Debug for PineconeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeIndex").field("host", &self.host).finish_non_exhaustive()
    }
}

#[async_trait]
impl IndexHandle for PineconeIndex {
    fn host(&self) -> &str {
        &self.host
    }

    async fn upsert(&self, records: &[Record], namespace: &str) -> Result<usize> {
        let context = "upsert";
        let response = self
            .post("/vectors/upsert")
            .json(&UpsertRequest { vectors: records, namespace })
            .send()
            .await
            .map_err(|e| request_error(context, e))?;

        if !response.status().is_success() {
            return Err(api_error(context, response).await);
        }
        let body: UpsertResponse = response.json().await.map_err(|e| request_error(context, e))?;
        debug!(host = %self.host, namespace, count = body.upserted_count, "upserted vectors");
        Ok(body.upserted_count)
    }

    async fn query(&self, request: &QueryRequest) -> Result<Option<QueryResponse>> {
        let context = "query";
        let response =
            self.post("/query").json(request).send().await.map_err(|e| request_error(context, e))?;

        if !response.status().is_success() {
            return Err(api_error(context, response).await);
        }
        let body = response.text().await.map_err(|e| request_error(context, e))?;
        parse_query_body(&body)
    }
}

/// Parse a query response body; an empty body is `None`.
fn parse_query_body(body: &str) -> Result<Option<QueryResponse>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(body)
        .map(Some)
        .map_err(|e| index_error(format!("query: failed to parse response: {e}")))
}
