//! Batched record submission.

use tracing::{debug, error, info};

use crate::document::Record;
use crate::error::{IngestError, Result};
use crate::index::IndexHandle;

/// Number of records sent per upsert call.
pub const UPSERT_BATCH_SIZE: usize = 100;

/// Submit records to an index in batches of [`UPSERT_BATCH_SIZE`].
///
/// Returns the total number of records the index acknowledged. Upserts are
/// keyed by record id, so re-submitting ids overwrites what is stored.
///
/// # Errors
///
/// - [`IngestError::EmptyRecordSetError`] if `records` is empty
/// - the first remote failure; earlier batches stay written
pub async fn upsert_records(
    handle: &dyn IndexHandle,
    records: &[Record],
    namespace: &str,
) -> Result<usize> {
    upsert_in_batches(handle, records, namespace, UPSERT_BATCH_SIZE).await
}

/// Like [`upsert_records`] with an explicit batch size.
pub async fn upsert_in_batches(
    handle: &dyn IndexHandle,
    records: &[Record],
    namespace: &str,
    batch_size: usize,
) -> Result<usize> {
    if records.is_empty() {
        return Err(IngestError::EmptyRecordSetError);
    }

    let mut upserted = 0;
    for (batch_index, batch) in records.chunks(batch_size.max(1)).enumerate() {
        let count = handle.upsert(batch, namespace).await.inspect_err(|e| {
            error!(
                host = handle.host(),
                namespace,
                batch_index,
                upserted,
                error = %e,
                "upsert batch failed"
            );
        })?;
        debug!(batch_index, count, "upserted batch");
        upserted += count;
    }

    info!(namespace, record_count = records.len(), upserted, "upserted all records");
    Ok(upserted)
}
