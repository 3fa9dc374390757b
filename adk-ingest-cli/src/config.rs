//! JSON configuration file for the CLI.
//!
//! ```json
//! {
//!   "source": { "file_name": "report.pdf", "file_type": "pdf", "start_on_page": 2 },
//!   "index": { "name": "rag-768", "host": "rag-768-abc123.svc.pinecone.io" },
//!   "embedding": { "base_url": "http://localhost:8080/v1", "model": "paraphrase-multilingual-mpnet-base-v2" }
//! }
//! ```

use std::path::Path;

use adk_ingest::openai::OpenAIEmbeddingProvider;
use adk_ingest::{IndexConfig, SourceConfig};
use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Top-level CLI configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub index: IndexConfig,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
}

/// Embedding endpoint settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbeddingSettings {
    /// OpenAI-compatible base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Vector size; defaults to the index dimension.
    #[serde(default)]
    pub dimensions: Option<usize>,
    /// Ask the server to truncate to `dimensions`.
    #[serde(default)]
    pub truncate: bool,
    /// Environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.source.validate()?;
        config.index.validate()?;
        Ok(config)
    }

    /// Build the embedding provider, sized to the index unless overridden.
    pub fn embedding_provider(&self) -> Result<OpenAIEmbeddingProvider> {
        let settings = &self.embedding;
        let key_env = settings.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV);
        let api_key = std::env::var(key_env)
            .with_context(|| format!("{key_env} must be set for the embedding endpoint"))?;

        let mut provider = OpenAIEmbeddingProvider::new(api_key)?;
        if let Some(base_url) = &settings.base_url {
            provider = provider.with_base_url(base_url);
        }
        if let Some(model) = &settings.model {
            provider = provider.with_model(model);
        }
        let dimensions = settings.dimensions.unwrap_or(self.index.dimension);
        provider = if settings.truncate {
            provider.with_dimensions(dimensions)
        } else {
            provider.with_native_dimensions(dimensions)
        };
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use adk_ingest::{Metric, SourceType};

    use super::*;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config = AppConfig::parse(
            r#"{
                "source": { "file_name": "survey.csv", "file_type": "csv", "start_row": 1 },
                "index": { "name": "rag-768" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.source.file_type, SourceType::Csv);
        assert_eq!(config.source.start, Some(1));
        assert_eq!(config.source.text_column(), "text");
        assert_eq!(config.index.dimension, 768);
        assert_eq!(config.index.metric, Metric::Cosine);
        assert!(config.embedding.base_url.is_none());
        assert!(!config.embedding.truncate);
    }

    #[test]
    fn parses_embedding_section() {
        let config = AppConfig::parse(
            r#"{
                "source": { "file_name": "report.pdf", "file_type": "pdf" },
                "index": { "name": "rag-768", "namespace": "reports", "metric": "dotproduct" },
                "embedding": {
                    "base_url": "http://localhost:8080/v1",
                    "model": "paraphrase-multilingual-mpnet-base-v2",
                    "api_key_env": "EMBEDDING_API_KEY"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.index.namespace.as_deref(), Some("reports"));
        assert_eq!(config.index.metric, Metric::Dotproduct);
        assert_eq!(config.embedding.api_key_env.as_deref(), Some("EMBEDDING_API_KEY"));
    }

    #[test]
    fn rejects_inverted_range() {
        let err = AppConfig::parse(
            r#"{
                "source": { "file_name": "report.pdf", "file_type": "pdf", "start": 5, "end": 2 },
                "index": { "name": "rag-768" }
            }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("cannot be greater than"));
    }

    #[test]
    fn rejects_unknown_source_type() {
        let result = AppConfig::parse(
            r#"{
                "source": { "file_name": "notes.docx", "file_type": "docx" },
                "index": { "name": "rag-768" }
            }"#,
        );
        assert!(result.is_err());
    }
}
