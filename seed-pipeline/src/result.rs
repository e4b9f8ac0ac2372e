use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of seeding one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedResult {
    pub collection_name: String,
    pub total_records: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
    /// A unit-level failure cut the unit short before its records were tried.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub aborted: bool,
}

impl SeedResult {
    pub fn new(collection_name: impl Into<String>, total_records: usize) -> Self {
        Self {
            collection_name: collection_name.into(),
            total_records,
            ..Self::default()
        }
    }

    fn uncounted(&self) -> usize {
        self.total_records
            .saturating_sub(self.success_count)
            .saturating_sub(self.error_count)
    }

    pub fn record_successes(&mut self, count: usize) {
        self.success_count = self.success_count.saturating_add(count.min(self.uncounted()));
    }

    /// Counts `count` failed records under one message.
    pub fn record_errors(&mut self, count: usize, message: impl Into<String>) {
        self.error_count = self.error_count.saturating_add(count.min(self.uncounted()));
        self.errors.push(message.into());
    }

    /// Gives up on the unit: every record not yet counted is failed.
    pub fn abort(&mut self, message: impl Into<String>) {
        let remaining = self.uncounted();
        self.record_errors(remaining, message);
        self.aborted = true;
    }

    pub fn set_duration(&mut self, elapsed: Duration) {
        self.duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    }

    pub fn is_clean(&self) -> bool {
        self.error_count == 0 && self.errors.is_empty()
    }
}

/// Aggregate over one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub total_collections: usize,
    pub total_records: usize,
    pub successful_records: usize,
    pub failed_records: usize,
    pub collections: Vec<SeedResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub load_errors: Vec<String>,
    pub fatal_units: usize,
    pub total_duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl SeedSummary {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            total_collections: 0,
            total_records: 0,
            successful_records: 0,
            failed_records: 0,
            collections: Vec::new(),
            load_errors: Vec::new(),
            fatal_units: 0,
            total_duration_ms: 0,
            timestamp,
        }
    }

    pub fn push(&mut self, result: SeedResult) {
        self.total_collections = self.total_collections.saturating_add(1);
        self.total_records = self.total_records.saturating_add(result.total_records);
        self.successful_records = self
            .successful_records
            .saturating_add(result.success_count);
        self.failed_records = self.failed_records.saturating_add(result.error_count);
        if result.aborted {
            self.fatal_units = self.fatal_units.saturating_add(1);
        }
        self.collections.push(result);
    }

    pub fn record_load_error(&mut self, message: impl Into<String>) {
        self.fatal_units = self.fatal_units.saturating_add(1);
        self.load_errors.push(message.into());
    }

    pub fn set_duration(&mut self, elapsed: Duration) {
        self.total_duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    }

    pub fn has_fatal_failures(&self) -> bool {
        self.fatal_units > 0
    }
}
