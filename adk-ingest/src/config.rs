//! Configuration records for sources and vector indexes.
//!
//! Both records deserialize from the same JSON shape the ingestion configs use
//! on disk, and both have validating builders for programmatic construction.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};

/// Directory that relative `file_name`s resolve against when no `file_path` is set.
pub const DEFAULT_DATA_DIR: &str = "data_files";

/// Column read from CSV sources when none is configured.
pub const DEFAULT_TEXT_COLUMN: &str = "text";

/// Dimension of `paraphrase-multilingual-mpnet-base-v2` embeddings.
pub const DEFAULT_DIMENSION: usize = 768;

/// The kind of document a source holds.
///
/// Serializes lowercase; deserializes case-insensitively.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum SourceType {
    /// A PDF document; one unit per page.
    Pdf,
    /// A CSV table; one unit per row of the text column.
    Csv,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => f.write_str("pdf"),
            Self::Csv => f.write_str("csv"),
        }
    }
}

impl std::str::FromStr for SourceType {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "csv" => Ok(Self::Csv),
            other => Err(IngestError::ConfigError(format!("unsupported file_type '{other}'"))),
        }
    }
}

impl TryFrom<String> for SourceType {
    type Error = IngestError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Where to read a document from and which slice of it to ingest.
///
/// `start` and `end` select the half-open range `[start, end)` of pages (PDF)
/// or data rows (CSV). Both are optional: `start` defaults to the first unit and
/// `end` to one past the last.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    /// Logical name of the source. Also the namespace fallback on upsert.
    pub file_name: String,
    /// Explicit location; defaults to `data_files/<file_name>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    /// Document format.
    pub file_type: SourceType,
    /// Column holding the text to embed (CSV only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_column: Option<String>,
    /// First unit to ingest (inclusive).
    #[serde(default, alias = "start_row", alias = "start_on_page")]
    pub start: Option<usize>,
    /// Unit to stop before (exclusive).
    #[serde(default, alias = "end_row", alias = "end_on_page")]
    pub end: Option<usize>,
}

impl SourceConfig {
    /// Create a new builder for a source with the given name and type.
    pub fn builder(file_name: impl Into<String>, file_type: SourceType) -> SourceConfigBuilder {
        SourceConfigBuilder {
            config: SourceConfig {
                file_name: file_name.into(),
                file_path: None,
                file_type,
                text_column: None,
                start: None,
                end: None,
            },
        }
    }

    /// The resolved location of the source.
    pub fn path(&self) -> PathBuf {
        match &self.file_path {
            Some(path) => path.clone(),
            None => Path::new(DEFAULT_DATA_DIR).join(&self.file_name),
        }
    }

    /// The CSV column to read, falling back to [`DEFAULT_TEXT_COLUMN`].
    pub fn text_column(&self) -> &str {
        self.text_column.as_deref().unwrap_or(DEFAULT_TEXT_COLUMN)
    }

    /// Check that the record can be acted on without touching the source.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::ConfigError`] if `file_name` is empty or
    /// `start > end`.
    pub fn validate(&self) -> Result<()> {
        if self.file_name.trim().is_empty() {
            return Err(IngestError::ConfigError("file_name is required".to_string()));
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(IngestError::ConfigError(format!(
                    "start ({start}) cannot be greater than end ({end})"
                )));
            }
        }
        Ok(())
    }

    /// Resolve the configured slice against a source holding `len` units.
    ///
    /// `end` is clamped to `len`. The returned range may be empty.
    pub(crate) fn resolve_range(&self, len: usize) -> std::ops::Range<usize> {
        let end = self.end.map_or(len, |end| end.min(len));
        let start = self.start.unwrap_or(0).min(end);
        start..end
    }
}

/// Builder for constructing a validated [`SourceConfig`].
#[derive(Debug, Clone)]
pub struct SourceConfigBuilder {
    config: SourceConfig,
}

impl SourceConfigBuilder {
    /// Set an explicit path to the source file.
    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.file_path = Some(path.into());
        self
    }

    /// Set the CSV column holding the text.
    pub fn text_column(mut self, column: impl Into<String>) -> Self {
        self.config.text_column = Some(column.into());
        self
    }

    /// Set the first unit to ingest.
    pub fn start(mut self, start: usize) -> Self {
        self.config.start = Some(start);
        self
    }

    /// Set the unit to stop before.
    pub fn end(mut self, end: usize) -> Self {
        self.config.end = Some(end);
        self
    }

    /// Build the [`SourceConfig`].
    ///
    /// # Errors
    ///
    /// See [`SourceConfig::validate`].
    pub fn build(self) -> Result<SourceConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Similarity metric of a vector index.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Cosine similarity.
    #[default]
    Cosine,
    /// Euclidean distance.
    Euclidean,
    /// Dot product.
    Dotproduct,
}

/// Whether the remote index can be deleted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeletionProtection {
    /// The index can be deleted.
    #[default]
    Disabled,
    /// Deletion is refused by the service.
    Enabled,
}

/// Placement of a serverless index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerlessSpec {
    /// Cloud provider, e.g. `aws`.
    pub cloud: String,
    /// Region, e.g. `us-east-1`.
    pub region: String,
}

impl Default for ServerlessSpec {
    fn default() -> Self {
        Self { cloud: "aws".to_string(), region: "us-east-1".to_string() }
    }
}

/// Deployment spec sent when creating an index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexSpec {
    /// A serverless index.
    Serverless(ServerlessSpec),
}

impl Default for IndexSpec {
    fn default() -> Self {
        Self::Serverless(ServerlessSpec::default())
    }
}

fn default_dimension() -> usize {
    DEFAULT_DIMENSION
}

fn default_tags() -> HashMap<String, String> {
    HashMap::from([("environment".to_string(), "development".to_string())])
}

/// Description of the remote index to write to and read from.
///
/// `host` is routing data only: it addresses an existing index and is never
/// sent when creating one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexConfig {
    /// Index name; used to check existence and to create the index.
    pub name: String,
    /// Namespace for records. Falls back to the source name when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Vector dimension used when creating the index.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Similarity metric used when creating the index.
    #[serde(default)]
    pub metric: Metric,
    /// Endpoint of an existing index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Deployment spec used when creating the index.
    #[serde(default)]
    pub spec: IndexSpec,
    /// Deletion protection used when creating the index.
    #[serde(default)]
    pub deletion_protection: DeletionProtection,
    /// Tags used when creating the index.
    #[serde(default = "default_tags")]
    pub tags: HashMap<String, String>,
}

impl IndexConfig {
    /// Create a new builder for the index with the given name.
    pub fn builder(name: impl Into<String>) -> IndexConfigBuilder {
        IndexConfigBuilder {
            config: IndexConfig {
                name: name.into(),
                namespace: None,
                dimension: DEFAULT_DIMENSION,
                metric: Metric::default(),
                host: None,
                spec: IndexSpec::default(),
                deletion_protection: DeletionProtection::default(),
                tags: default_tags(),
            },
        }
    }

    /// The namespace to use, falling back to `source_name` when unset or blank.
    pub fn namespace_or<'a>(&'a self, source_name: &'a str) -> &'a str {
        match self.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => ns,
            _ => source_name,
        }
    }

    /// Validate the record.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::ConfigError`] if `name` is empty or
    /// `dimension == 0`.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(IngestError::ConfigError("index name is required".to_string()));
        }
        if self.dimension == 0 {
            return Err(IngestError::ConfigError(
                "index dimension must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`IndexConfig`].
#[derive(Debug, Clone)]
pub struct IndexConfigBuilder {
    config: IndexConfig,
}

impl IndexConfigBuilder {
    /// Set the namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = Some(namespace.into());
        self
    }

    /// Set the vector dimension.
    pub fn dimension(mut self, dimension: usize) -> Self {
        self.config.dimension = dimension;
        self
    }

    /// Set the similarity metric.
    pub fn metric(mut self, metric: Metric) -> Self {
        self.config.metric = metric;
        self
    }

    /// Set the host of an existing index.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = Some(host.into());
        self
    }

    /// Set the deployment spec.
    pub fn spec(mut self, spec: IndexSpec) -> Self {
        self.config.spec = spec;
        self
    }

    /// Set deletion protection.
    pub fn deletion_protection(mut self, protection: DeletionProtection) -> Self {
        self.config.deletion_protection = protection;
        self
    }

    /// Add a tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.tags.insert(key.into(), value.into());
        self
    }

    /// Build the [`IndexConfig`].
    ///
    /// # Errors
    ///
    /// See [`IndexConfig::validate`].
    pub fn build(self) -> Result<IndexConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_range() {
        let err = SourceConfig::builder("report.pdf", SourceType::Pdf)
            .start(5)
            .end(2)
            .build()
            .unwrap_err();
        assert!(matches!(err, IngestError::ConfigError(_)));
    }

    #[test]
    fn resolves_open_ended_range() {
        let config = SourceConfig::builder("rows.csv", SourceType::Csv).start(2).build().unwrap();
        assert_eq!(config.resolve_range(10), 2..10);
        assert_eq!(config.resolve_range(1), 1..1);
    }

    #[test]
    fn clamps_end_to_source_length() {
        let config =
            SourceConfig::builder("rows.csv", SourceType::Csv).start(1).end(50).build().unwrap();
        assert_eq!(config.resolve_range(4), 1..4);
    }

    #[test]
    fn deserializes_legacy_range_keys() {
        let config: SourceConfig = serde_json::from_str(
            r#"{"file_name": "stats.pdf", "file_type": "pdf", "start_on_page": 3, "end_on_page": 9}"#,
        )
        .unwrap();
        assert_eq!(config.file_type, SourceType::Pdf);
        assert_eq!((config.start, config.end), (Some(3), Some(9)));
        assert_eq!(config.path(), Path::new("data_files").join("stats.pdf"));
    }

    #[test]
    fn file_type_is_case_insensitive() {
        let config: SourceConfig =
            serde_json::from_str(r#"{"file_name": "STATS.PDF", "file_type": "PDF"}"#).unwrap();
        assert_eq!(config.file_type, SourceType::Pdf);
        let config: SourceConfig =
            serde_json::from_str(r#"{"file_name": "rows.csv", "file_type": "Csv"}"#).unwrap();
        assert_eq!(config.file_type, SourceType::Csv);
        assert_eq!(serde_json::to_value(SourceType::Csv).unwrap(), "csv");
        assert!(serde_json::from_str::<SourceType>(r#""docx""#).is_err());
    }

    #[test]
    fn csv_text_column_defaults_to_text() {
        let config: SourceConfig =
            serde_json::from_str(r#"{"file_name": "rows.csv", "file_type": "csv"}"#).unwrap();
        assert_eq!(config.text_column(), "text");
    }

    #[test]
    fn index_config_defaults() {
        let config: IndexConfig = serde_json::from_str(r#"{"name": "rag-768"}"#).unwrap();
        assert_eq!(config.dimension, 768);
        assert_eq!(config.metric, Metric::Cosine);
        assert_eq!(config.deletion_protection, DeletionProtection::Disabled);
        assert_eq!(config.tags.get("environment").map(String::as_str), Some("development"));
        assert_eq!(
            serde_json::to_value(&config.spec).unwrap(),
            serde_json::json!({"serverless": {"cloud": "aws", "region": "us-east-1"}})
        );
    }

    #[test]
    fn namespace_falls_back_to_source_name() {
        let config = IndexConfig::builder("rag-768").build().unwrap();
        assert_eq!(config.namespace_or("stats.csv"), "stats.csv");

        let config = IndexConfig::builder("rag-768").namespace("").build().unwrap();
        assert_eq!(config.namespace_or("stats.csv"), "stats.csv");

        let config = IndexConfig::builder("rag-768").namespace("edu").build().unwrap();
        assert_eq!(config.namespace_or("stats.csv"), "edu");
    }

    #[test]
    fn rejects_zero_dimension() {
        let err = IndexConfig::builder("rag").dimension(0).build().unwrap_err();
        assert!(matches!(err, IngestError::ConfigError(_)));
    }
}
