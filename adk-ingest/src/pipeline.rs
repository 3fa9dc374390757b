//! Ingestion and retrieval pipeline orchestrator.
//!
//! The [`IngestPipeline`] composes an [`EmbeddingProvider`], an
//! [`IndexService`] and an [`IndexConfig`] into the two end-to-end paths:
//!
//! - ingestion: extract → reflow → vectorize → build records → ensure index → upsert
//! - retrieval: vectorize query → ensure index → similarity query
//!
//! # Example
//!
//! ```rust,ignore
//! use adk_ingest::{IngestPipeline, IndexConfig, InMemoryIndexService, SourceConfig, SourceType};
//!
//! let pipeline = IngestPipeline::builder()
//!     .index_config(IndexConfig::builder("rag-768").namespace("docs").build()?)
//!     .embedding_provider(Arc::new(my_embedder))
//!     .index_service(Arc::new(InMemoryIndexService::new()))
//!     .build()?;
//!
//! let source = SourceConfig::builder("report.pdf", SourceType::Pdf).start(2).build()?;
//! let report = pipeline.ingest(&source).await?;
//! let matches = pipeline.query("enrolment rates", &pipeline.retrieval_options(None), None).await;
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::config::{IndexConfig, SourceConfig};
use crate::document::{Record, ScoredMatch};
use crate::embedding::EmbeddingProvider;
use crate::error::{IngestError, Result};
use crate::extract::extractor_for;
use crate::index::{IndexHandle, IndexService};
use crate::provision::IndexProvisioner;
use crate::records::build_records;
use crate::retrieval::{MatchCallback, RetrievalOptions, Retriever};
use crate::upsert::upsert_records;
use crate::vectorize::Vectorizer;

/// Summary of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Logical name of the ingested source.
    pub source_name: String,
    /// Namespace the records were written to.
    pub namespace: String,
    /// Host of the index that received the records.
    pub host: String,
    /// Number of records built from the source.
    pub record_count: usize,
    /// Number of records the index acknowledged.
    pub upserted_count: usize,
}

/// The ingestion and retrieval pipeline.
///
/// Construct one via [`IngestPipeline::builder()`]. A pipeline holds no
/// per-run state; every call to [`ingest`](Self::ingest) owns its own
/// passages, vectors and records.
pub struct IngestPipeline {
    index_config: IndexConfig,
    vectorizer: Vectorizer,
    provisioner: IndexProvisioner,
    retriever: Retriever,
}

impl IngestPipeline {
    /// Create a new [`IngestPipelineBuilder`].
    pub fn builder() -> IngestPipelineBuilder {
        IngestPipelineBuilder::default()
    }

    /// Return a reference to the index configuration.
    pub fn index_config(&self) -> &IndexConfig {
        &self.index_config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        self.vectorizer.provider()
    }

    /// Default retrieval options: the configured namespace, or `source_name`
    /// when none is configured.
    pub fn retrieval_options(&self, source_name: Option<&str>) -> RetrievalOptions {
        RetrievalOptions::new(self.index_config.namespace_or(source_name.unwrap_or_default()))
    }

    /// Extract, reflow, embed and pair a source into upsert-ready records.
    ///
    /// # Errors
    ///
    /// Any extraction error, [`IngestError::EmbeddingError`], or
    /// [`IngestError::NoEmbeddingsError`].
    pub async fn prepare_records(&self, source: &SourceConfig) -> Result<Vec<Record>> {
        source.validate()?;

        let extractor = extractor_for(source.file_type);
        let passages = extractor.extract(source).await?;
        let vectors = self.vectorizer.vectorize(&passages).await?;
        build_records(&passages, vectors)
    }

    /// Ensure the configured index exists and return a handle to it.
    ///
    /// # Errors
    ///
    /// See [`IndexProvisioner::ensure_index`].
    pub async fn ensure_index(&self) -> Result<Arc<dyn IndexHandle>> {
        self.provisioner.ensure_index(&self.index_config).await
    }

    /// Ensure the index and upsert already-built records.
    ///
    /// `source_name` is the namespace fallback. An empty record set is
    /// rejected before the index is touched.
    ///
    /// # Errors
    ///
    /// [`IngestError::EmptyRecordSetError`] for zero records, provisioning
    /// errors, or the first failed upsert batch.
    pub async fn upsert(&self, records: &[Record], source_name: &str) -> Result<usize> {
        if records.is_empty() {
            return Err(IngestError::EmptyRecordSetError);
        }
        let handle = self.ensure_index().await?;
        let namespace = self.index_config.namespace_or(source_name);
        upsert_records(handle.as_ref(), records, namespace).await
    }

    /// Run the full ingestion path for one source.
    ///
    /// # Errors
    ///
    /// Returns the first failing stage's error. A range error is returned
    /// before the source is read.
    pub async fn ingest(&self, source: &SourceConfig) -> Result<IngestReport> {
        let records = self.prepare_records(source).await.inspect_err(|e| {
            error!(source = %source.file_name, error = %e, "failed to prepare records");
        })?;

        let handle = self.ensure_index().await?;
        let namespace = self.index_config.namespace_or(&source.file_name).to_string();
        let upserted_count = upsert_records(handle.as_ref(), &records, &namespace).await?;

        let report = IngestReport {
            source_name: source.file_name.clone(),
            namespace,
            host: handle.host().to_string(),
            record_count: records.len(),
            upserted_count,
        };
        info!(
            source = %report.source_name,
            namespace = %report.namespace,
            record_count = report.record_count,
            upserted_count = report.upserted_count,
            "ingested source"
        );
        Ok(report)
    }

    /// Retrieve passages similar to `text`.
    ///
    /// Never fails: provisioning errors, like every other read-path failure,
    /// produce an empty result.
    pub async fn query(
        &self,
        text: &str,
        options: &RetrievalOptions,
        callback: Option<MatchCallback<'_>>,
    ) -> Vec<ScoredMatch> {
        let handle = match self.ensure_index().await {
            Ok(handle) => handle,
            Err(e) => {
                error!(index = %self.index_config.name, error = %e, "cannot query index");
                return Vec::new();
            }
        };
        let matches = self.retriever.retrieve(handle.as_ref(), text, options, callback).await;
        info!(match_count = matches.len(), "query completed");
        matches
    }
}

/// Builder for constructing an [`IngestPipeline`].
///
/// `index_config`, `embedding_provider` and `index_service` are required.
#[derive(Default)]
pub struct IngestPipelineBuilder {
    index_config: Option<IndexConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    index_service: Option<Arc<dyn IndexService>>,
    embedding_batch_size: Option<usize>,
}

impl IngestPipelineBuilder {
    /// Set the index configuration.
    pub fn index_config(mut self, config: IndexConfig) -> Self {
        self.index_config = Some(config);
        self
    }

    /// Set the embedding provider used for both passages and queries.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the index service.
    pub fn index_service(mut self, service: Arc<dyn IndexService>) -> Self {
        self.index_service = Some(service);
        self
    }

    /// Override the embedding batch size.
    pub fn embedding_batch_size(mut self, batch_size: usize) -> Self {
        self.embedding_batch_size = Some(batch_size);
        self
    }

    /// Build the [`IngestPipeline`].
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::ConfigError`] if a required field is missing,
    /// the index config is invalid, or the provider's dimension differs from
    /// the index dimension.
    pub fn build(self) -> Result<IngestPipeline> {
        let index_config = self
            .index_config
            .ok_or_else(|| IngestError::ConfigError("index_config is required".to_string()))?;
        let provider = self
            .embedding_provider
            .ok_or_else(|| IngestError::ConfigError("embedding_provider is required".to_string()))?;
        let service = self
            .index_service
            .ok_or_else(|| IngestError::ConfigError("index_service is required".to_string()))?;

        index_config.validate()?;
        if provider.dimensions() != index_config.dimension {
            return Err(IngestError::ConfigError(format!(
                "embedding provider produces {}-dimensional vectors but index '{}' expects {}",
                provider.dimensions(),
                index_config.name,
                index_config.dimension
            )));
        }

        let mut vectorizer = Vectorizer::new(provider);
        if let Some(batch_size) = self.embedding_batch_size {
            vectorizer = vectorizer.with_batch_size(batch_size);
        }

        Ok(IngestPipeline {
            index_config,
            retriever: Retriever::new(vectorizer.clone()),
            vectorizer,
            provisioner: IndexProvisioner::new(service),
        })
    }
}
