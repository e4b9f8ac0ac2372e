use std::fmt;

use crate::{
    pipeline::iso8601,
    result::{SeedResult, SeedSummary},
};

/// Error messages printed per unit before the rest are folded into a count.
pub const MAX_ERRORS_SHOWN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    Success,
    Partial,
    Failed,
}

impl CollectionStatus {
    pub fn of(result: &SeedResult) -> Self {
        if result.error_count == 0 {
            Self::Success
        } else if result.error_count >= result.total_records {
            Self::Failed
        } else {
            Self::Partial
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "ok",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percentage of records written, 100 for an empty run.
#[allow(clippy::cast_precision_loss)]
pub fn success_rate(summary: &SeedSummary) -> f64 {
    if summary.total_records == 0 {
        return 100.0;
    }
    summary.successful_records as f64 / summary.total_records as f64 * 100.0
}

fn error_lines(errors: &[String], indent: &str) -> Vec<String> {
    let mut lines: Vec<String> = errors
        .iter()
        .take(MAX_ERRORS_SHOWN)
        .map(|message| format!("{indent}- {message}"))
        .collect();
    if errors.len() > MAX_ERRORS_SHOWN {
        lines.push(format!(
            "{indent}... +{} more",
            errors.len() - MAX_ERRORS_SHOWN
        ));
    }
    lines
}

pub fn render_result(result: &SeedResult) -> String {
    let status = CollectionStatus::of(result);
    let mut lines = vec![format!(
        "[{status}] {}: {}/{} records seeded, {} failed ({} ms)",
        result.collection_name,
        result.success_count,
        result.total_records,
        result.error_count,
        result.duration_ms
    )];
    lines.extend(error_lines(&result.errors, "    "));
    lines.join("\n")
}

pub fn render_summary(summary: &SeedSummary) -> String {
    let mut lines = vec![
        format!("Seed summary ({})", iso8601(summary.timestamp)),
        format!("  collections:  {}", summary.total_collections),
        format!(
            "  records:      {} ({} succeeded, {} failed)",
            summary.total_records, summary.successful_records, summary.failed_records
        ),
        format!("  success rate: {:.1}%", success_rate(summary)),
        format!("  duration:     {} ms", summary.total_duration_ms),
    ];

    if summary.fatal_units > 0 {
        lines.push(format!("  fatal units:  {}", summary.fatal_units));
    }

    if !summary.load_errors.is_empty() {
        lines.push(format!("  load errors:  {}", summary.load_errors.len()));
        lines.extend(error_lines(&summary.load_errors, "    "));
    }

    lines.join("\n")
}
