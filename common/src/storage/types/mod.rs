use serde_json::{Map, Value};

/// One document's fields, in source order.
pub type SeedRecord = Map<String, Value>;

pub const ID_FIELD: &str = "id";
pub const TITLE_FIELD: &str = "title";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";
pub const SEED_VERSION_FIELD: &str = "seedVersion";
pub const SEED_TIMESTAMP_FIELD: &str = "seedTimestamp";

/// Identity of a record: a string `id`, or a numeric one rendered as text.
/// `Ok(None)` means the record carries no `id` at all.
pub fn record_id(record: &SeedRecord) -> Result<Option<String>, String> {
    match record.get(ID_FIELD) {
        None => Ok(None),
        Some(Value::String(id)) if id.trim().is_empty() => Err("empty `id`".to_string()),
        Some(Value::String(id)) => Ok(Some(id.clone())),
        Some(Value::Number(id)) => Ok(Some(id.to_string())),
        Some(other) => Err(format!("`id` must be a string or number, found {other}")),
    }
}

/// Short human label for diagnostics: the id, else the title.
pub fn record_label(record: &SeedRecord) -> Option<String> {
    record_id(record).ok().flatten().or_else(|| {
        record
            .get(TITLE_FIELD)
            .and_then(Value::as_str)
            .map(ToString::to_string)
    })
}
