//! PDF extractor.
//!
//! Uses lopdf to decode the document, then extracts each page on its own
//! blocking task. Page texts are joined back in page order and reflowed.

use std::sync::Arc;

use async_trait::async_trait;
use lopdf::Document;
use tracing::{debug, warn};

use super::{Extractor, read_source};
use crate::config::{SourceConfig, SourceType};
use crate::document::{Passage, SourceUnit};
use crate::error::{IngestError, Result};
use crate::reflow::reflow;

/// Extractor for PDF files; one unit per page.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for PdfExtractor {
    fn source_type(&self) -> SourceType {
        SourceType::Pdf
    }

    async fn extract_units(&self, source: &SourceConfig) -> Result<Vec<SourceUnit>> {
        source.validate()?;

        let path = source.path();
        debug!(path = %path.display(), "reading pdf");
        let bytes = read_source(&path).await?;

        let document = tokio::task::spawn_blocking(move || Document::load_mem(&bytes))
            .await
            .map_err(|e| IngestError::PipelineError(format!("pdf load task failed: {e}")))?
            .map_err(|e| IngestError::SourceReadError {
                path: path.clone(),
                message: e.to_string(),
            })?;

        // lopdf page numbers are 1-based and returned in order.
        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
        let range = source.resolve_range(page_numbers.len());
        if range.is_empty() {
            return Err(IngestError::EmptySourceError { source_name: source.file_name.clone() });
        }

        let document = Arc::new(document);
        let tasks = page_numbers[range.clone()].iter().enumerate().map(|(i, &page_number)| {
            if i % 100 == 0 {
                debug!(page = page_number, "processing page");
            }
            let document = Arc::clone(&document);
            tokio::task::spawn_blocking(move || match document.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(e) => {
                    warn!(page = page_number, error = %e, "failed to extract page text");
                    String::new()
                }
            })
        });

        // try_join_all yields results in task order, not completion order.
        let texts = futures::future::try_join_all(tasks)
            .await
            .map_err(|e| IngestError::PipelineError(format!("page extraction task failed: {e}")))?;

        debug!(page_count = texts.len(), "completed pdf text extraction");

        Ok(texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| SourceUnit::new(range.start + i, text))
            .collect())
    }

    fn to_passages(&self, units: Vec<SourceUnit>) -> Vec<Passage> {
        reflow(units.into_iter().map(|unit| unit.text))
    }
}
