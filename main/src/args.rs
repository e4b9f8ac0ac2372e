use std::path::PathBuf;

use clap::Parser;
use common::{
    error::AppError,
    utils::config::{AppConfig, SeedTarget},
};
use seed_pipeline::SeedConfig;

/// Seed site content from a bundle directory into the document store.
#[derive(Debug, Clone, Parser)]
#[command(name = "seed", version, about)]
pub struct Args {
    /// Store to write into: emulator (local) or production
    #[arg(long, env = "SEED_TARGET", default_value_t = SeedTarget::Emulator)]
    pub target: SeedTarget,

    /// Confirm production writes up front instead of prompting
    #[arg(long)]
    pub confirm: bool,

    /// Directory holding bundle.json and the files it names
    #[arg(long)]
    pub content_dir: Option<PathBuf>,

    /// Seed only this collection (repeatable)
    #[arg(long = "collection", value_name = "NAME")]
    pub collections: Vec<String>,

    /// Skip this collection (repeatable)
    #[arg(long = "exclude", value_name = "NAME")]
    pub exclude: Vec<String>,

    /// Records per committed batch, defaults to the target's size
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Delete existing documents of each collection before writing
    #[arg(long)]
    pub clear_existing: bool,

    /// Reject records without an `id` or `title`
    #[arg(long)]
    pub validate: bool,

    /// Value stamped into `seedVersion`, overrides the bundle
    #[arg(long)]
    pub seed_version: Option<String>,

    /// Print the summary as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Skip the pause between batch commits
    #[arg(long)]
    pub no_delay: bool,
}

impl Args {
    pub fn seed_config(&self, config: &AppConfig) -> Result<SeedConfig, AppError> {
        let mut seed = SeedConfig::for_target(self.target);
        seed.confirmed = self.confirm;

        if let Some(batch_size) = self.batch_size {
            if batch_size == 0 {
                return Err(AppError::Validation(
                    "--batch-size must be at least 1".to_string(),
                ));
            }
            seed.options.batch_size = batch_size;
        }

        seed.options.clear_existing = self.clear_existing;
        seed.options.validate_data = self.validate;
        seed.options.exclude_collections = self.exclude.iter().cloned().collect();
        if !self.collections.is_empty() {
            seed.options.only_collections = Some(self.collections.iter().cloned().collect());
        }
        seed.options.seed_version = self
            .seed_version
            .clone()
            .or_else(|| config.seed_version.clone());

        if self.no_delay {
            seed.tuning = seed.tuning.without_delay();
        }

        Ok(seed)
    }

    pub fn content_dir(&self, config: &AppConfig) -> PathBuf {
        self.content_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.content_dir))
    }
}
