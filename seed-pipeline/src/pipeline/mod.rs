mod batch;
mod config;
mod document;
mod stamp;
mod state;

pub use batch::{clear_collection, into_chunks, seed_collection};
pub use config::{SeedConfig, SeedOptions, SeedTuning, DEFAULT_SEED_VERSION};
pub use document::seed_document;
pub use stamp::{iso8601, SeedStamp};

use std::{sync::Arc, time::Instant};

use chrono::Utc;
use common::{
    error::AppError,
    storage::document::{DocumentStore, StoreProvider},
};
use state_machines::core::GuardError;
use tracing::{error, info, warn};

use self::state::idle;
use crate::{
    confirmation::ConfirmationProvider,
    result::{SeedResult, SeedSummary},
    source::SeedBundle,
    unit::SeedUnit,
};

#[allow(clippy::module_name_repetitions)]
pub struct SeedPipeline {
    config: SeedConfig,
    provider: Arc<dyn StoreProvider>,
    confirmation: Arc<dyn ConfirmationProvider>,
}

impl SeedPipeline {
    pub fn new(
        config: SeedConfig,
        provider: Arc<dyn StoreProvider>,
        confirmation: Arc<dyn ConfirmationProvider>,
    ) -> Self {
        Self {
            config,
            provider,
            confirmation,
        }
    }

    pub fn config(&self) -> &SeedConfig {
        &self.config
    }

    pub async fn run(&self, bundle: SeedBundle) -> Result<SeedSummary, AppError> {
        self.run_with_progress(bundle, &mut |_: &SeedResult| {}).await
    }

    /// Seeds every unit of `bundle` in order, calling `on_result` after each.
    ///
    /// Only a denied confirmation or a store that cannot be reached fail the
    /// run; everything else is reported in the summary.
    #[tracing::instrument(
        skip_all,
        fields(seed_target = %self.config.target, units = bundle.units.len())
    )]
    pub async fn run_with_progress(
        &self,
        bundle: SeedBundle,
        on_result: &mut (dyn FnMut(&SeedResult) + Send),
    ) -> Result<SeedSummary, AppError> {
        let started = Instant::now();
        let machine = idle();

        let machine = if self.config.target.requires_confirmation() && !self.config.confirmed {
            let confirming = machine
                .request_confirmation()
                .map_err(|(_, guard)| map_guard_error("request_confirmation", &guard))?;
            let prompt = format!(
                "About to seed {} units into the {} target. Continue?",
                bundle.units.len(),
                self.config.target
            );

            if !self.confirmation.confirm(&prompt).await {
                let _aborted = confirming
                    .abort()
                    .map_err(|(_, guard)| map_guard_error("abort", &guard))?;
                warn!(
                    seed_target = %self.config.target,
                    "seeding not confirmed; nothing was written"
                );
                return Err(AppError::ConfirmationDenied);
            }

            confirming
                .begin()
                .map_err(|(_, guard)| map_guard_error("begin", &guard))?
        } else {
            machine
                .begin()
                .map_err(|(_, guard)| map_guard_error("begin", &guard))?
        };

        let store = match self.provider.connect().await {
            Ok(store) => store,
            Err(err) => {
                let _aborted = machine
                    .abort()
                    .map_err(|(_, guard)| map_guard_error("abort", &guard))?;
                error!(
                    seed_target = %self.config.target,
                    error = %err,
                    "could not initialize document store"
                );
                return Err(match err {
                    AppError::StoreInitialization(_) => err,
                    other => AppError::StoreInitialization(other.to_string()),
                });
            }
        };

        let options = &self.config.options;
        let seed_version = options
            .seed_version
            .clone()
            .or(bundle.seed_version)
            .unwrap_or_else(|| DEFAULT_SEED_VERSION.to_string());
        let stamp = SeedStamp::new(seed_version, Utc::now());
        let mut summary = SeedSummary::new(stamp.seeded_at);

        for load_error in bundle.load_errors {
            let filtered_out = !load_error.collections.is_empty()
                && !load_error
                    .collections
                    .iter()
                    .any(|collection| options.includes(collection));
            if filtered_out {
                info!(
                    collections = ?load_error.collections,
                    error = %load_error.message,
                    "load error for filtered out collections; ignoring"
                );
                continue;
            }
            summary.record_load_error(load_error.message);
        }

        for unit in bundle.units {
            let collection = unit.collection_name().to_string();
            if !options.includes(&collection) {
                info!(collection = %collection, "collection filtered out; skipping");
                continue;
            }

            let result = self.seed_unit(store.as_ref(), unit, &stamp).await;
            on_result(&result);
            summary.push(result);
        }

        let machine = machine
            .report()
            .map_err(|(_, guard)| map_guard_error("report", &guard))?;
        summary.set_duration(started.elapsed());
        info!(
            seed_target = %self.config.target,
            collections = summary.total_collections,
            total = summary.total_records,
            succeeded = summary.successful_records,
            failed = summary.failed_records,
            fatal_units = summary.fatal_units,
            duration_ms = summary.total_duration_ms,
            "seed run finished"
        );
        let _done = machine
            .finish()
            .map_err(|(_, guard)| map_guard_error("finish", &guard))?;

        Ok(summary)
    }

    async fn seed_unit(
        &self,
        store: &dyn DocumentStore,
        unit: SeedUnit,
        stamp: &SeedStamp,
    ) -> SeedResult {
        match unit {
            SeedUnit::Collection { name, records } => {
                seed_collection(
                    store,
                    &name,
                    records,
                    &self.config.options,
                    &self.config.tuning,
                    stamp,
                )
                .await
            }
            SeedUnit::Document {
                collection,
                document_id,
                label,
                data,
            } => seed_document(store, &collection, &document_id, data, &label, stamp).await,
        }
    }
}

fn map_guard_error(event: &str, guard: &GuardError) -> AppError {
    AppError::InternalError(format!(
        "invalid seed run transition during {event}: {guard:?}"
    ))
}

#[cfg(test)]
mod tests;
