//! Source extraction.
//!
//! This module provides the [`Extractor`] trait and one implementation per
//! [`SourceType`]:
//!
//! - [`PdfExtractor`]: one unit per page, pages read concurrently, reflowed
//! - [`CsvExtractor`]: one unit per row of a text column, no reflow
//!
//! Use [`extractor_for`] to select the implementation from a source's type tag.

mod delimited;
mod pdf;

use std::path::Path;

use async_trait::async_trait;
use tracing::info;

pub use delimited::CsvExtractor;
pub use pdf::PdfExtractor;

use crate::config::{SourceConfig, SourceType};
use crate::document::{Passage, SourceUnit};
use crate::error::{IngestError, Result};

/// Reads a document into ordered text units and turns them into passages.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// The source type this extractor reads.
    fn source_type(&self) -> SourceType;

    /// Read the configured slice of the source as ordered units.
    ///
    /// # Errors
    ///
    /// - [`IngestError::ConfigError`] if `start > end`, before any I/O
    /// - [`IngestError::SourceNotFoundError`] if the file does not exist
    /// - [`IngestError::EmptySourceError`] if the source or the slice is empty
    async fn extract_units(&self, source: &SourceConfig) -> Result<Vec<SourceUnit>>;

    /// Turn ordered units into passages.
    fn to_passages(&self, units: Vec<SourceUnit>) -> Vec<Passage>;

    /// Read the source and produce passages in source order.
    async fn extract(&self, source: &SourceConfig) -> Result<Vec<Passage>> {
        let units = self.extract_units(source).await?;
        let unit_count = units.len();
        let passages = self.to_passages(units);
        info!(
            source = %source.file_name,
            source_type = %self.source_type(),
            unit_count,
            passage_count = passages.len(),
            "extracted source"
        );
        if passages.is_empty() {
            return Err(IngestError::EmptySourceError { source_name: source.file_name.clone() });
        }
        Ok(passages)
    }
}

/// Select the extractor for a source type.
pub fn extractor_for(source_type: SourceType) -> Box<dyn Extractor> {
    match source_type {
        SourceType::Pdf => Box::new(PdfExtractor::new()),
        SourceType::Csv => Box::new(CsvExtractor::new()),
    }
}

/// Read a source file, mapping a missing file to [`IngestError::SourceNotFoundError`].
async fn read_source(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            IngestError::SourceNotFoundError { path: path.to_path_buf() }
        }
        _ => IngestError::SourceReadError { path: path.to_path_buf(), message: e.to_string() },
    })
}
