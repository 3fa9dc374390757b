//! Similarity retrieval with soft failure.
//!
//! Unlike ingestion, the read path never returns an error: any failure to
//! embed, any remote failure, and any absent or malformed response all
//! degrade to an empty match list.

use tracing::{debug, error, warn};

use crate::document::ScoredMatch;
use crate::index::{IndexHandle, QueryRequest};
use crate::vectorize::Vectorizer;

/// Number of matches returned when no `top_k` is given.
pub const DEFAULT_TOP_K: usize = 3;

/// Per-match hook, called in response order.
pub type MatchCallback<'a> = &'a (dyn Fn(&ScoredMatch) + Send + Sync);

/// Parameters of a retrieval query.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalOptions {
    /// Namespace to search.
    pub namespace: String,
    /// Maximum number of matches.
    pub top_k: usize,
    /// Return stored metadata with each match.
    pub include_metadata: bool,
    /// Return stored vector values with each match.
    pub include_values: bool,
}

impl RetrievalOptions {
    /// Options for a namespace with the defaults: three matches, metadata and
    /// values included.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            top_k: DEFAULT_TOP_K,
            include_metadata: true,
            include_values: true,
        }
    }

    /// Set the maximum number of matches.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set whether metadata is returned.
    pub fn include_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    /// Set whether vector values are returned.
    pub fn include_values(mut self, include: bool) -> Self {
        self.include_values = include;
        self
    }
}

/// Embeds query text and runs a similarity query against an index.
#[derive(Debug, Clone)]
pub struct Retriever {
    vectorizer: Vectorizer,
}

impl Retriever {
    /// Create a retriever. The vectorizer must wrap the provider used at
    /// ingestion time.
    pub fn new(vectorizer: Vectorizer) -> Self {
        Self { vectorizer }
    }

    /// Query `handle` for passages similar to `text`.
    ///
    /// Returns an empty `Vec` when the text is empty, when embedding or the
    /// remote query fails, or when the response has no matches. `callback` is
    /// called once per returned match and does not affect the result.
    pub async fn retrieve(
        &self,
        handle: &dyn IndexHandle,
        text: &str,
        options: &RetrievalOptions,
        callback: Option<MatchCallback<'_>>,
    ) -> Vec<ScoredMatch> {
        if text.trim().is_empty() {
            warn!("query text is empty");
            return Vec::new();
        }

        let vector = match self.vectorizer.vectorize_query(text).await {
            Ok(vector) => vector,
            Err(e) => {
                error!(error = %e, "query embedding failed");
                return Vec::new();
            }
        };

        let request = QueryRequest {
            namespace: options.namespace.clone(),
            vector,
            top_k: options.top_k,
            include_metadata: options.include_metadata,
            include_values: options.include_values,
        };

        let response = match handle.query(&request).await {
            Ok(Some(response)) => response,
            Ok(None) => {
                warn!(host = handle.host(), "no response received from index");
                return Vec::new();
            }
            Err(e) => {
                error!(
                    host = handle.host(),
                    namespace = %options.namespace,
                    error = %e,
                    "query failed"
                );
                return Vec::new();
            }
        };

        let Some(matches) = response.matches else {
            warn!(host = handle.host(), "response has no matches field");
            return Vec::new();
        };
        if matches.is_empty() {
            debug!(namespace = %options.namespace, "no matches found");
            return Vec::new();
        }

        for m in &matches {
            debug!(
                id = %m.id,
                score = m.score,
                value_count = m.values.len(),
                original_text = m.original_text().unwrap_or_default(),
                "match"
            );
            if let Some(callback) = callback {
                callback(m);
            }
        }

        matches
    }
}
