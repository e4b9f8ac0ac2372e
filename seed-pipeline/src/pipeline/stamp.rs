use chrono::{DateTime, SecondsFormat, Utc};
use common::{
    error::AppError,
    storage::types::{
        SeedRecord, CREATED_AT_FIELD, SEED_TIMESTAMP_FIELD, SEED_VERSION_FIELD, UPDATED_AT_FIELD,
    },
};
use serde_json::Value;

pub fn iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Metadata written onto every seeded document of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedStamp {
    pub seed_version: String,
    pub seeded_at: DateTime<Utc>,
}

impl SeedStamp {
    pub fn new(seed_version: impl Into<String>, seeded_at: DateTime<Utc>) -> Self {
        Self {
            seed_version: seed_version.into(),
            seeded_at,
        }
    }

    /// Stamps `record` as written at `now`. A non-blank `createdAt` is kept,
    /// the other three fields are always overwritten.
    pub fn apply(
        &self,
        mut record: SeedRecord,
        now: DateTime<Utc>,
    ) -> Result<SeedRecord, AppError> {
        let now = iso8601(now);

        let has_created_at = match record.get(CREATED_AT_FIELD) {
            None | Some(Value::Null) => false,
            Some(Value::String(existing)) => !existing.trim().is_empty(),
            Some(other) => {
                return Err(AppError::RecordStamping(format!(
                    "`{CREATED_AT_FIELD}` must be an ISO-8601 string, found {other}"
                )))
            }
        };
        if !has_created_at {
            record.insert(CREATED_AT_FIELD.to_string(), Value::String(now.clone()));
        }

        record.insert(UPDATED_AT_FIELD.to_string(), Value::String(now));
        record.insert(
            SEED_VERSION_FIELD.to_string(),
            Value::String(self.seed_version.clone()),
        );
        record.insert(
            SEED_TIMESTAMP_FIELD.to_string(),
            Value::String(iso8601(self.seeded_at)),
        );

        Ok(record)
    }
}
