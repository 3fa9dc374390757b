//! Data types for source units, passages, records, and query matches.

use serde::{Deserialize, Serialize};

/// One page (PDF) or one row (CSV) of raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Zero-based position of the unit within the source.
    pub position: usize,
    /// The raw extracted text.
    pub text: String,
}

impl SourceUnit {
    /// Create a unit at the given position.
    pub fn new(position: usize, text: impl Into<String>) -> Self {
        Self { position, text: text.into() }
    }
}

/// A reflowed chunk of text, ready to be embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// The passage text. Never empty after trimming.
    pub text: String,
}

impl Passage {
    /// Create a passage from text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl From<&str> for Passage {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Metadata stored alongside each vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// The passage the vector was computed from.
    #[serde(default)]
    pub original_text: String,
}

/// An upsert-ready vector with its identifier and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier; the passage position rendered as a string.
    pub id: String,
    /// The embedding vector.
    pub values: Vec<f32>,
    /// Metadata carrying the source text.
    pub metadata: RecordMetadata,
}

/// A single similarity match returned by an index query.
///
/// `values` and `metadata` are only present when requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMatch {
    /// Record identifier.
    pub id: String,
    /// Similarity score (higher is more relevant for cosine and dot product).
    #[serde(default)]
    pub score: f32,
    /// Stored vector values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<f32>,
    /// Stored metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RecordMetadata>,
}

impl ScoredMatch {
    /// The original passage text, if metadata was returned.
    pub fn original_text(&self) -> Option<&str> {
        self.metadata.as_ref().map(|m| m.original_text.as_str())
    }
}
