//! Pairing passages with their vectors as upsert-ready records.

use tracing::{debug, info};

use crate::document::{Passage, Record, RecordMetadata};
use crate::error::{IngestError, Result};

/// Build one [`Record`] per passage/vector pair.
///
/// Record ids are the zero-based passage positions (`"0"`, `"1"`, ...).
/// Re-ingesting the same slice of the same source therefore reproduces the
/// same ids, and an upsert overwrites the vectors stored under them.
///
/// # Errors
///
/// - [`IngestError::NoEmbeddingsError`] if `vectors` is empty
/// - [`IngestError::PipelineError`] if the two sequences differ in length
pub fn build_records(passages: &[Passage], vectors: Vec<Vec<f32>>) -> Result<Vec<Record>> {
    if vectors.is_empty() {
        return Err(IngestError::NoEmbeddingsError);
    }
    if passages.len() != vectors.len() {
        return Err(IngestError::PipelineError(format!(
            "{} passages but {} embeddings",
            passages.len(),
            vectors.len()
        )));
    }

    let records: Vec<Record> = passages
        .iter()
        .zip(vectors)
        .enumerate()
        .map(|(index, (passage, values))| Record {
            id: index.to_string(),
            values,
            metadata: RecordMetadata { original_text: passage.text.clone() },
        })
        .collect();

    for record in records.iter().take(5) {
        debug!(id = %record.id, text = %record.metadata.original_text, "prepared record");
    }
    info!(record_count = records.len(), "prepared records for upsert");

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_passage_positions() {
        let passages: Vec<Passage> =
            ["alpha", "beta", "gamma"].into_iter().map(Passage::from).collect();
        let vectors = vec![vec![1.0], vec![2.0], vec![3.0]];

        let records = build_records(&passages, vectors).unwrap();

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["0", "1", "2"]);
        assert_eq!(records[1].values, vec![2.0]);
        assert_eq!(records[2].metadata.original_text, "gamma");
    }

    #[test]
    fn empty_vectors_are_rejected() {
        let passages = vec![Passage::new("orphan")];
        let err = build_records(&passages, Vec::new()).unwrap_err();
        assert!(matches!(err, IngestError::NoEmbeddingsError));

        let err = build_records(&[], Vec::new()).unwrap_err();
        assert!(matches!(err, IngestError::NoEmbeddingsError));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let passages = vec![Passage::new("a"), Passage::new("b")];
        let err = build_records(&passages, vec![vec![0.5]]).unwrap_err();
        assert!(matches!(err, IngestError::PipelineError(_)));
    }

    #[test]
    fn record_serializes_to_upsert_shape() {
        let records = build_records(&[Passage::new("hello")], vec![vec![0.25, 0.5]]).unwrap();
        assert_eq!(
            serde_json::to_value(&records[0]).unwrap(),
            serde_json::json!({
                "id": "0",
                "values": [0.25, 0.5],
                "metadata": {"original_text": "hello"}
            })
        );
    }
}
