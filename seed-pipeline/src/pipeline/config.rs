use std::{collections::BTreeSet, time::Duration};

use common::utils::config::SeedTarget;

pub const DEFAULT_SEED_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedOptions {
    /// Delete every document in the target collection before writing.
    pub clear_existing: bool,
    pub batch_size: usize,
    /// Reject records that carry neither an `id` nor a `title`.
    pub validate_data: bool,
    pub exclude_collections: BTreeSet<String>,
    /// When set, only these collections are seeded.
    pub only_collections: Option<BTreeSet<String>>,
    /// Overrides the bundle's `seedVersion`.
    pub seed_version: Option<String>,
}

impl SeedOptions {
    pub fn for_target(target: SeedTarget) -> Self {
        Self {
            batch_size: target.default_batch_size(),
            ..Self::default()
        }
    }

    pub fn includes(&self, collection: &str) -> bool {
        if self.exclude_collections.contains(collection) {
            return false;
        }
        self.only_collections
            .as_ref()
            .map_or(true, |only| only.contains(collection))
    }
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            clear_existing: false,
            batch_size: SeedTarget::Emulator.default_batch_size(),
            validate_data: false,
            exclude_collections: BTreeSet::new(),
            only_collections: None,
            seed_version: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedTuning {
    /// Pause between consecutive chunk commits of one collection.
    pub chunk_delay: Duration,
    /// Deadline for a single chunk commit.
    pub commit_timeout: Duration,
}

impl SeedTuning {
    pub fn for_target(target: SeedTarget) -> Self {
        Self {
            chunk_delay: target.chunk_delay(),
            commit_timeout: target.commit_timeout(),
        }
    }

    /// No pauses, used by tests and `--no-delay`.
    #[must_use]
    pub fn without_delay(mut self) -> Self {
        self.chunk_delay = Duration::ZERO;
        self
    }
}

impl Default for SeedTuning {
    fn default() -> Self {
        Self::for_target(SeedTarget::Emulator)
    }
}

#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub target: SeedTarget,
    /// Production writes were confirmed up front (`--confirm`).
    pub confirmed: bool,
    pub options: SeedOptions,
    pub tuning: SeedTuning,
}

impl SeedConfig {
    pub fn for_target(target: SeedTarget) -> Self {
        Self {
            target,
            confirmed: false,
            options: SeedOptions::for_target(target),
            tuning: SeedTuning::for_target(target),
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self::for_target(SeedTarget::Emulator)
    }
}
