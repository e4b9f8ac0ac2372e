use std::time::Instant;

use chrono::Utc;
use common::{error::AppError, storage::document::DocumentStore};
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::stamp::SeedStamp;
use crate::{result::SeedResult, unit::as_record};

/// Seeds one singleton document such as the site's hero or footer content.
#[instrument(skip_all, fields(collection = %collection, document_id = %document_id))]
pub async fn seed_document(
    store: &dyn DocumentStore,
    collection: &str,
    document_id: &str,
    data: Value,
    label: &str,
    stamp: &SeedStamp,
) -> SeedResult {
    let started = Instant::now();
    let mut result = SeedResult::new(collection, 1);

    let outcome = async {
        let record = as_record(data).map_err(AppError::RecordStamping)?;
        let stamped = stamp.apply(record, Utc::now())?;
        store.set_document(collection, document_id, stamped).await
    }
    .await;

    match outcome {
        Ok(()) => {
            result.record_successes(1);
            info!(
                collection = %collection,
                document_id = %document_id,
                label = %label,
                "document seeded"
            );
        }
        Err(err) => {
            warn!(
                collection = %collection,
                document_id = %document_id,
                error = %err,
                "document seed failed"
            );
            result.record_errors(1, format!("[{label}] {err}"));
        }
    }

    result.set_duration(started.elapsed());
    result
}
