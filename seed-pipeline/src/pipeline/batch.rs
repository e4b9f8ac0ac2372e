use std::time::Instant;

use chrono::Utc;
use common::{
    error::AppError,
    storage::{
        document::{DocRef, DocumentStore},
        types::{record_id, record_label, SeedRecord},
    },
};
use serde_json::Value;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

use super::{
    config::{SeedOptions, SeedTuning},
    stamp::SeedStamp,
};
use crate::{result::SeedResult, unit::as_record};

/// Splits `items` into consecutive chunks of at most `size`, keeping order.
pub fn into_chunks<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let size = size.max(1);
    let mut chunks = Vec::with_capacity(items.len().div_ceil(size));
    let mut items = items.into_iter().peekable();
    while items.peek().is_some() {
        chunks.push(items.by_ref().take(size).collect());
    }
    chunks
}

/// Seeds `records` into the collection `name`.
///
/// Never fails: clear failures, bad records and rejected commits all end up
/// counted in the returned [`SeedResult`].
#[instrument(skip_all, fields(collection = %name, records = records.len()))]
pub async fn seed_collection(
    store: &dyn DocumentStore,
    name: &str,
    records: Vec<Value>,
    options: &SeedOptions,
    tuning: &SeedTuning,
    stamp: &SeedStamp,
) -> SeedResult {
    let started = Instant::now();
    let mut result = SeedResult::new(name, records.len());

    if records.is_empty() {
        debug!(collection = %name, "no records to seed");
        return result;
    }

    if options.clear_existing {
        match clear_collection(store, name, options.batch_size, tuning).await {
            Ok(cleared) => info!(collection = %name, cleared, "cleared existing documents"),
            Err(err) => {
                warn!(collection = %name, error = %err, "clearing failed; skipping collection");
                result.abort(format!("[clear {name}] {err}"));
                result.set_duration(started.elapsed());
                return result;
            }
        }
    }

    let chunks = into_chunks(records, options.batch_size);
    let chunk_total = chunks.len();
    let mut record_index = 0usize;

    for (chunk_index, chunk) in chunks.into_iter().enumerate() {
        let chunk_number = chunk_index.saturating_add(1);
        let mut batch = store.new_batch();

        for value in chunk {
            record_index = record_index.saturating_add(1);
            let label = match &value {
                Value::Object(record) => record_label(record),
                _ => None,
            };

            match prepare_record(store, name, value, options, stamp) {
                Ok((doc, data)) => {
                    batch.set(doc, data);
                }
                Err(err) => {
                    let prefix = match label {
                        Some(label) => format!("[record {record_index} ({label})]"),
                        None => format!("[record {record_index}]"),
                    };
                    warn!(
                        collection = %name,
                        record = record_index,
                        error = %err,
                        "record skipped"
                    );
                    result.record_errors(1, format!("{prefix} {err}"));
                }
            }
        }

        let staged = batch.len();
        if staged > 0 {
            match timeout(tuning.commit_timeout, store.commit(batch)).await {
                Ok(Ok(())) => {
                    result.record_successes(staged);
                    debug!(
                        collection = %name,
                        chunk = chunk_number,
                        chunks = chunk_total,
                        records = staged,
                        "chunk committed"
                    );
                }
                Ok(Err(err)) => {
                    warn!(
                        collection = %name,
                        chunk = chunk_number,
                        error = %err,
                        "chunk commit failed"
                    );
                    result.record_errors(
                        staged,
                        format!("[batch {chunk_number}/{chunk_total}] {err}"),
                    );
                }
                Err(_) => {
                    warn!(collection = %name, chunk = chunk_number, "chunk commit timed out");
                    result.record_errors(
                        staged,
                        format!(
                            "[batch {chunk_number}/{chunk_total}] commit timed out after {} ms",
                            tuning.commit_timeout.as_millis()
                        ),
                    );
                }
            }
        }

        if chunk_number < chunk_total && !tuning.chunk_delay.is_zero() {
            sleep(tuning.chunk_delay).await;
        }
    }

    result.set_duration(started.elapsed());
    info!(
        collection = %name,
        total = result.total_records,
        succeeded = result.success_count,
        failed = result.error_count,
        duration_ms = result.duration_ms,
        "collection seeded"
    );
    result
}

/// Deletes every document in `name`, `batch_size` deletes per commit, each
/// commit bound by `tuning.commit_timeout`. Returns the number removed.
///
/// Stops at the first failed delete commit; earlier deletes stay committed.
pub async fn clear_collection(
    store: &dyn DocumentStore,
    name: &str,
    batch_size: usize,
    tuning: &SeedTuning,
) -> Result<usize, AppError> {
    let clear_error = |message: String| AppError::ClearCollection {
        collection: name.to_string(),
        message,
    };

    let existing = store
        .list_documents(name)
        .await
        .map_err(|err| clear_error(err.to_string()))?;
    let total = existing.len();

    for docs in into_chunks(existing, batch_size) {
        let mut batch = store.new_batch();
        for doc in docs {
            batch.delete(doc);
        }
        match timeout(tuning.commit_timeout, store.commit(batch)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(clear_error(err.to_string())),
            Err(_) => {
                return Err(clear_error(format!(
                    "delete batch timed out after {} ms",
                    tuning.commit_timeout.as_millis()
                )))
            }
        }
    }

    Ok(total)
}

fn prepare_record(
    store: &dyn DocumentStore,
    collection: &str,
    value: Value,
    options: &SeedOptions,
    stamp: &SeedStamp,
) -> Result<(DocRef, SeedRecord), AppError> {
    let record = as_record(value).map_err(AppError::RecordStamping)?;

    if options.validate_data && record_label(&record).is_none() {
        return Err(AppError::RecordStamping(
            "record has neither `id` nor `title`".to_string(),
        ));
    }

    let id = record_id(&record)
        .map_err(AppError::RecordStamping)?
        .unwrap_or_else(|| store.generate_id());
    let data = stamp.apply(record, Utc::now())?;

    Ok((DocRef::new(collection, id), data))
}
