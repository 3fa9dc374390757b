//! Remote vector index traits and request/response types.
//!
//! An [`IndexService`] answers control-plane questions (does an index exist,
//! create one, open one by host). An [`IndexHandle`] is bound to one index and
//! serves upserts and similarity queries.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{DeletionProtection, IndexConfig, IndexSpec, Metric};
use crate::document::{Record, ScoredMatch};
use crate::error::Result;

/// Parameters for creating an index.
///
/// Built from an [`IndexConfig`] minus its routing fields: there is no host
/// here, and no namespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateIndexRequest {
    /// Index name.
    pub name: String,
    /// Vector dimension.
    pub dimension: usize,
    /// Similarity metric.
    pub metric: Metric,
    /// Deployment spec.
    pub spec: IndexSpec,
    /// Deletion protection.
    pub deletion_protection: DeletionProtection,
    /// Tags.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

impl From<&IndexConfig> for CreateIndexRequest {
    fn from(config: &IndexConfig) -> Self {
        Self {
            name: config.name.clone(),
            dimension: config.dimension,
            metric: config.metric,
            spec: config.spec.clone(),
            deletion_protection: config.deletion_protection,
            tags: config.tags.clone(),
        }
    }
}

/// A similarity query against one namespace.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Namespace to search.
    pub namespace: String,
    /// Query vector.
    pub vector: Vec<f32>,
    /// Maximum number of matches.
    pub top_k: usize,
    /// Return stored metadata with each match.
    pub include_metadata: bool,
    /// Return stored vector values with each match.
    pub include_values: bool,
}

/// The body of a query response.
///
/// `matches` is optional because services may omit it entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    /// Matches ordered by relevance.
    #[serde(default)]
    pub matches: Option<Vec<ScoredMatch>>,
    /// Namespace that was searched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Control plane of a vector index service.
#[async_trait]
pub trait IndexService: Send + Sync {
    /// Whether an index with this name exists.
    async fn has_index(&self, name: &str) -> Result<bool>;

    /// Create an index and return a handle once it can accept writes.
    ///
    /// Returns [`IngestError::IndexAlreadyExistsError`](crate::IngestError::IndexAlreadyExistsError)
    /// when the name is taken.
    async fn create_index(&self, request: &CreateIndexRequest) -> Result<Arc<dyn IndexHandle>>;

    /// Bind a handle to an existing index by host.
    fn open_index(&self, host: &str) -> Result<Arc<dyn IndexHandle>>;
}

/// Data plane of a single index.
#[async_trait]
pub trait IndexHandle: Send + Sync {
    /// Host this handle addresses.
    fn host(&self) -> &str;

    /// Store records under a namespace, overwriting records with the same id.
    ///
    /// Returns the number of records the service acknowledged.
    async fn upsert(&self, records: &[Record], namespace: &str) -> Result<usize>;

    /// Run a similarity query. `None` means the service returned no body.
    async fn query(&self, request: &QueryRequest) -> Result<Option<QueryResponse>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_carries_no_routing_fields() {
        let config = IndexConfig::builder("rag-768")
            .host("https://rag-768-abc.svc.pinecone.io")
            .namespace("edu")
            .build()
            .unwrap();

        let request = CreateIndexRequest::from(&config);
        let body = serde_json::to_value(&request).unwrap();

        assert!(body.get("host").is_none());
        assert!(body.get("namespace").is_none());
        assert_eq!(body["name"], "rag-768");
        assert_eq!(body["dimension"], 768);
        assert_eq!(body["metric"], "cosine");
        assert_eq!(body["deletion_protection"], "disabled");
        assert_eq!(body["tags"]["environment"], "development");
    }

    #[test]
    fn query_request_uses_camel_case() {
        let request = QueryRequest {
            namespace: "ns".into(),
            vector: vec![0.1],
            top_k: 3,
            include_metadata: true,
            include_values: false,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["topK"], 3);
        assert_eq!(body["includeMetadata"], true);
        assert_eq!(body["includeValues"], false);
    }

    #[test]
    fn response_without_matches_deserializes() {
        let response: QueryResponse = serde_json::from_str(r#"{"namespace": "ns"}"#).unwrap();
        assert!(response.matches.is_none());

        let response: QueryResponse = serde_json::from_str(
            r#"{"matches": [{"id": "4", "score": 0.9, "metadata": {"original_text": "hi"}}]}"#,
        )
        .unwrap();
        let matches = response.matches.unwrap();
        assert_eq!(matches[0].original_text(), Some("hi"));
        assert!(matches[0].values.is_empty());
    }
}
