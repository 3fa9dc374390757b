//! Batched vectorization of passages.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::document::Passage;
use crate::embedding::EmbeddingProvider;
use crate::error::{IngestError, Result};

/// Number of passages sent to the embedding provider per call.
pub const EMBEDDING_BATCH_SIZE: usize = 32;

/// Turns passages into embedding vectors in fixed-size batches.
///
/// Each batch runs on its own tokio task, so encoding is scheduled
/// independently of the task coordinating the pipeline. Output order and
/// length always match the input.
#[derive(Clone)]
pub struct Vectorizer {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl Vectorizer {
    /// Create a vectorizer using [`EMBEDDING_BATCH_SIZE`].
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider, batch_size: EMBEDDING_BATCH_SIZE }
    }

    /// Override the batch size. Values below one are treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// The provider used for every batch.
    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Embed passages in order.
    ///
    /// Empty input yields empty output.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::EmbeddingError`] if the provider fails, returns
    /// the wrong number of vectors for a batch, or returns a vector of the
    /// wrong dimension.
    pub async fn vectorize(&self, passages: &[Passage]) -> Result<Vec<Vec<f32>>> {
        if passages.is_empty() {
            info!("no passages to embed");
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(passages.len());
        for (batch_index, batch) in passages.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|p| p.text.clone()).collect();
            debug!(batch_index, batch_size = texts.len(), "embedding batch");
            let embedded = self.spawn_batch(texts).await?;
            vectors.extend(embedded);
        }

        info!(
            provider = self.provider.name(),
            vector_count = vectors.len(),
            "embedded passages"
        );
        Ok(vectors)
    }

    /// Embed a single query text with the same provider used for passages.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::EmbeddingError`] on provider failure or a
    /// dimension mismatch.
    pub async fn vectorize_query(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.provider.embed(text).await?;
        self.check_dimension(&vector)?;
        Ok(vector)
    }

    async fn spawn_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let provider = Arc::clone(&self.provider);
        let expected = texts.len();
        let vectors = tokio::spawn(async move {
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            provider.embed_batch(&refs).await
        })
        .await
        .map_err(|e| IngestError::PipelineError(format!("embedding task failed: {e}")))?
        .inspect_err(|e| error!(error = %e, "embedding batch failed"))?;

        if vectors.len() != expected {
            return Err(self.embedding_error(format!(
                "expected {expected} vectors for batch, got {}",
                vectors.len()
            )));
        }
        for vector in &vectors {
            self.check_dimension(vector)?;
        }
        Ok(vectors)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        let expected = self.provider.dimensions();
        if vector.len() != expected {
            return Err(self.embedding_error(format!(
                "expected {expected}-dimensional vector, got {}",
                vector.len()
            )));
        }
        Ok(())
    }

    fn embedding_error(&self, message: String) -> IngestError {
        IngestError::EmbeddingError { provider: self.provider.name().to_string(), message }
    }
}

impl std::fmt::Debug for Vectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vectorizer")
            .field("provider", &self.provider.name())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}
