//! Error types for the `adk-ingest` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while ingesting or retrieving passages.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A configuration validation error (bad range, missing required field).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The source file does not exist.
    #[error("Source not found: {}", path.display())]
    SourceNotFoundError {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// The requested text column is not present in the CSV header.
    #[error("Column '{column}' not found in {}", path.display())]
    ColumnNotFoundError {
        /// The missing column name.
        column: String,
        /// The CSV file that was read.
        path: PathBuf,
    },

    /// The source exists but could not be read or parsed.
    #[error("Failed to read source {}: {message}", path.display())]
    SourceReadError {
        /// The source file.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// The source, or the requested slice of it, has no text units.
    #[error("Source '{source_name}' produced no text units")]
    EmptySourceError {
        /// Logical name of the source.
        source_name: String,
    },

    /// An upsert was requested with zero records.
    #[error("Record set is empty; nothing to upsert")]
    EmptyRecordSetError,

    /// Records were requested but no embeddings were produced.
    #[error("No embeddings to build records from")]
    NoEmbeddingsError,

    /// The index exists but no host was configured to address it.
    #[error("Index '{index}' exists but no host is configured")]
    MissingHostError {
        /// The index name.
        index: String,
    },

    /// Creation raced with another process that created the same index.
    ///
    /// The provisioner recovers from this by binding to the existing index.
    #[error("Index '{index}' already exists")]
    IndexAlreadyExistsError {
        /// The index name.
        index: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A remote index call failed.
    #[error("Index error ({backend}): {message}")]
    IndexError {
        /// The index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error in the ingestion pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

impl IngestError {
    /// Whether the pipeline may recover from this error and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::IndexAlreadyExistsError { .. })
    }
}

/// A convenience result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
