//! # adk-ingest
//!
//! Document ingestion and similarity retrieval against remote vector indexes.
//!
//! PDF pages and CSV rows are extracted, reflowed into passages, embedded in
//! batches, and upserted into a vector index that is created on first use.
//! Queries embed text with the same provider and return the closest passages.
//!
//! ## Feature flags
//!
//! - `pinecone` (default): [`pinecone::PineconeClient`] over the Pinecone REST API
//! - `openai` (default): [`openai::OpenAIEmbeddingProvider`] for any
//!   OpenAI-compatible embeddings endpoint
//!
//! [`InMemoryIndexService`] is always available for tests and dry runs.

pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod index;
pub mod inmemory;
pub mod pipeline;
pub mod provision;
pub mod records;
pub mod reflow;
pub mod retrieval;
pub mod upsert;
pub mod vectorize;

#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "pinecone")]
pub mod pinecone;

pub use config::{
    DeletionProtection, IndexConfig, IndexConfigBuilder, IndexSpec, Metric, ServerlessSpec,
    SourceConfig, SourceConfigBuilder, SourceType,
};
pub use document::{Passage, Record, RecordMetadata, ScoredMatch, SourceUnit};
pub use embedding::EmbeddingProvider;
pub use error::{IngestError, Result};
pub use extract::{CsvExtractor, Extractor, PdfExtractor, extractor_for};
pub use index::{CreateIndexRequest, IndexHandle, IndexService, QueryRequest, QueryResponse};
pub use inmemory::{InMemoryIndex, InMemoryIndexService};
pub use pipeline::{IngestPipeline, IngestPipelineBuilder, IngestReport};
pub use provision::IndexProvisioner;
pub use records::build_records;
pub use reflow::reflow;
pub use retrieval::{DEFAULT_TOP_K, MatchCallback, RetrievalOptions, Retriever};
pub use upsert::{UPSERT_BATCH_SIZE, upsert_in_batches, upsert_records};
pub use vectorize::{EMBEDDING_BATCH_SIZE, Vectorizer};
