mod args;

use std::{
    io::IsTerminal,
    path::Path,
    process::ExitCode,
    sync::Arc,
};

use anyhow::Context;
use clap::Parser;
use common::{
    error::AppError,
    storage::db::SurrealStoreProvider,
    utils::config::{get_config, AppConfig},
};
use seed_pipeline::{
    confirmation::{ConfirmationProvider, StaticConfirmation, TerminalConfirmation},
    report::{render_result, render_summary},
    SeedConfig, SeedPipeline, SeedResult, SeedSummary, SourceLoader,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::args::Args;

const EXIT_FATAL_UNIT: u8 = 1;
const EXIT_NOT_CONFIRMED: u8 = 2;
const EXIT_SETUP_FAILED: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr, the report to stdout
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .ok();

    let args = Args::parse();

    match run(&args).await {
        Ok(summary) if summary.has_fatal_failures() => ExitCode::from(EXIT_FATAL_UNIT),
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            let message = format!("{err:#}");
            error!(error = %message, "seed run did not start");
            eprintln!("error: {message}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<AppError>() {
        Some(AppError::ConfirmationDenied) => EXIT_NOT_CONFIRMED,
        _ => EXIT_SETUP_FAILED,
    }
}

async fn run(args: &Args) -> anyhow::Result<SeedSummary> {
    let config = get_config().context("failed to load configuration")?;
    let seed_config = args.seed_config(&config)?;
    let content_dir = args.content_dir(&config);

    let confirmation: Arc<dyn ConfirmationProvider> = if std::io::stdin().is_terminal() {
        Arc::new(TerminalConfirmation)
    } else {
        Arc::new(StaticConfirmation::reject())
    };

    seed_from_dir(&config, seed_config, &content_dir, confirmation, args.json).await
}

async fn seed_from_dir(
    config: &AppConfig,
    seed_config: SeedConfig,
    content_dir: &Path,
    confirmation: Arc<dyn ConfirmationProvider>,
    json: bool,
) -> anyhow::Result<SeedSummary> {
    let bundle = SourceLoader::new(content_dir).load_bundle()?;
    info!(
        content_dir = %content_dir.display(),
        units = bundle.units.len(),
        load_errors = bundle.load_errors.len(),
        "loaded content bundle"
    );

    let provider = Arc::new(SurrealStoreProvider::new(
        seed_config.target.connection(config),
    ));
    let pipeline = SeedPipeline::new(seed_config, provider, confirmation);

    let summary = pipeline
        .run_with_progress(bundle, &mut |result: &SeedResult| {
            if !json {
                println!("{}", render_result(result));
            }
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("\n{}", render_summary(&summary));
    }

    Ok(summary)
}
