//! CSV extractor.
//!
//! Each data row of the configured text column is one unit and one passage;
//! rows are not reflowed.

use async_trait::async_trait;
use tracing::debug;

use super::{Extractor, read_source};
use crate::config::{SourceConfig, SourceType};
use crate::document::{Passage, SourceUnit};
use crate::error::{IngestError, Result};

/// Extractor for CSV files; one unit per data row.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExtractor;

impl CsvExtractor {
    /// Create a new CSV extractor.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for CsvExtractor {
    fn source_type(&self) -> SourceType {
        SourceType::Csv
    }

    async fn extract_units(&self, source: &SourceConfig) -> Result<Vec<SourceUnit>> {
        source.validate()?;

        let path = source.path();
        debug!(path = %path.display(), "reading csv");
        let bytes = read_source(&path).await?;

        let read_err = |e: csv::Error| IngestError::SourceReadError {
            path: path.clone(),
            message: e.to_string(),
        };

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes.as_slice());
        let column = source.text_column();
        let column_index = reader
            .headers()
            .map_err(read_err)?
            .iter()
            .position(|header| header.trim() == column)
            .ok_or_else(|| IngestError::ColumnNotFoundError {
                column: column.to_string(),
                path: path.clone(),
            })?;

        let mut cells = Vec::new();
        for row in reader.records() {
            let row = row.map_err(read_err)?;
            cells.push(row.get(column_index).unwrap_or_default().to_string());
        }

        let range = source.resolve_range(cells.len());
        if range.is_empty() {
            return Err(IngestError::EmptySourceError { source_name: source.file_name.clone() });
        }

        debug!(from = range.start, to = range.end, "processing rows");
        let start = range.start;
        Ok(cells
            .drain(range)
            .enumerate()
            .map(|(i, text)| SourceUnit::new(start + i, text))
            .collect())
    }

    fn to_passages(&self, units: Vec<SourceUnit>) -> Vec<Passage> {
        units
            .into_iter()
            .filter_map(|unit| {
                let text = unit.text.trim();
                if text.is_empty() { None } else { Some(Passage::new(text)) }
            })
            .collect()
    }
}
