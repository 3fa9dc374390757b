//! In-memory vector index service.
//!
//! This module provides [`InMemoryIndexService`], a dependency-free stand-in
//! for a remote index service. Indexes are addressed by a synthetic host
//! (`<name>.in-memory.local`) in a registry guarded by a `std::sync::RwLock`;
//! each index keeps its records per namespace behind a `tokio::sync::RwLock`.
//! It is suitable for development, dry runs and tests.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::RwLock as AsyncRwLock;

use crate::config::Metric;
use crate::document::{Record, ScoredMatch};
use crate::error::{IngestError, Result};
use crate::index::{CreateIndexRequest, IndexHandle, IndexService, QueryRequest, QueryResponse};

const BACKEND: &str = "in-memory";

fn index_error(message: impl Into<String>) -> IngestError {
    IngestError::IndexError { backend: BACKEND.to_string(), message: message.into() }
}

/// An in-memory [`IndexService`].
///
/// # Example
///
/// ```rust,ignore
/// use adk_ingest::{InMemoryIndexService, IndexService};
///
/// let service = InMemoryIndexService::new();
/// let handle = service.create_index(&request).await?;
/// handle.upsert(&records, "docs").await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryIndexService {
    /// Host → index.
    indexes: RwLock<HashMap<String, Arc<InMemoryIndex>>>,
}

impl InMemoryIndexService {
    /// Create a new service with no indexes.
    pub fn new() -> Self {
        Self::default()
    }

    /// The host assigned to an index with the given name.
    pub fn host_for(name: &str) -> String {
        format!("{name}.in-memory.local")
    }

    /// Look up an index by name.
    pub fn index(&self, name: &str) -> Option<Arc<InMemoryIndex>> {
        let indexes = self.indexes.read().ok()?;
        indexes.get(&Self::host_for(name)).cloned()
    }
}

#[async_trait]
impl IndexService for InMemoryIndexService {
    async fn has_index(&self, name: &str) -> Result<bool> {
        let indexes = self.indexes.read().map_err(|_| index_error("index registry poisoned"))?;
        Ok(indexes.contains_key(&Self::host_for(name)))
    }

    async fn create_index(&self, request: &CreateIndexRequest) -> Result<Arc<dyn IndexHandle>> {
        let mut indexes =
            self.indexes.write().map_err(|_| index_error("index registry poisoned"))?;
        let host = Self::host_for(&request.name);
        if indexes.contains_key(&host) {
            return Err(IngestError::IndexAlreadyExistsError { index: request.name.clone() });
        }
        let index = Arc::new(InMemoryIndex::new(host.clone(), request.dimension, request.metric));
        indexes.insert(host, Arc::clone(&index));
        let handle: Arc<dyn IndexHandle> = index;
        Ok(handle)
    }

    fn open_index(&self, host: &str) -> Result<Arc<dyn IndexHandle>> {
        let indexes = self.indexes.read().map_err(|_| index_error("index registry poisoned"))?;
        let index = indexes
            .get(host)
            .cloned()
            .ok_or_else(|| index_error(format!("no index at host '{host}'")))?;
        let handle: Arc<dyn IndexHandle> = index;
        Ok(handle)
    }
}

/// A single in-memory index: namespace → record id → record.
#[derive(Debug)]
pub struct InMemoryIndex {
    host: String,
    dimension: usize,
    metric: Metric,
    namespaces: AsyncRwLock<HashMap<String, HashMap<String, Record>>>,
}

impl InMemoryIndex {
    fn new(host: String, dimension: usize, metric: Metric) -> Self {
        Self { host, dimension, metric, namespaces: AsyncRwLock::default() }
    }

    /// Number of records stored in a namespace.
    pub async fn record_count(&self, namespace: &str) -> usize {
        self.namespaces.read().await.get(namespace).map_or(0, HashMap::len)
    }

    /// Fetch a stored record by id.
    pub async fn fetch(&self, namespace: &str, id: &str) -> Option<Record> {
        self.namespaces.read().await.get(namespace).and_then(|records| records.get(id)).cloned()
    }

    fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.metric {
            Metric::Cosine => cosine_similarity(a, b),
            Metric::Dotproduct => a.iter().zip(b).map(|(x, y)| x * y).sum(),
            Metric::Euclidean => {
                a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
            }
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl IndexHandle for InMemoryIndex {
    fn host(&self) -> &str {
        &self.host
    }

    async fn upsert(&self, records: &[Record], namespace: &str) -> Result<usize> {
        if let Some(bad) = records.iter().find(|r| r.values.len() != self.dimension) {
            return Err(index_error(format!(
                "record '{}' has dimension {}, index expects {}",
                bad.id,
                bad.values.len(),
                self.dimension
            )));
        }

        let mut namespaces = self.namespaces.write().await;
        let store = namespaces.entry(namespace.to_string()).or_default();
        for record in records {
            store.insert(record.id.clone(), record.clone());
        }
        Ok(records.len())
    }

    async fn query(&self, request: &QueryRequest) -> Result<Option<QueryResponse>> {
        if request.vector.len() != self.dimension {
            return Err(index_error(format!(
                "query has dimension {}, index expects {}",
                request.vector.len(),
                self.dimension
            )));
        }

        let namespaces = self.namespaces.read().await;
        let mut matches: Vec<ScoredMatch> = namespaces
            .get(&request.namespace)
            .into_iter()
            .flat_map(HashMap::values)
            .map(|record| ScoredMatch {
                id: record.id.clone(),
                score: self.score(&record.values, &request.vector),
                values: if request.include_values { record.values.clone() } else { Vec::new() },
                metadata: request.include_metadata.then(|| record.metadata.clone()),
            })
            .collect();

        // Euclidean scores are distances: smaller is closer.
        let ascending = self.metric == Metric::Euclidean;
        matches.sort_by(|a, b| {
            let ord = b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal);
            let ord = if ascending { ord.reverse() } else { ord };
            // Ties resolve by id.
            ord.then_with(|| a.id.cmp(&b.id))
        });
        matches.truncate(request.top_k);

        Ok(Some(QueryResponse {
            matches: Some(matches),
            namespace: Some(request.namespace.clone()),
        }))
    }
}
