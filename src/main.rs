//! CLI entry point for the sku-images tool.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use sku_images_core::{DownloadEngine, HttpClient, RowSource, Throttle};
use tracing::{debug, error, info, warn};

mod app_config;
mod cli;

use app_config::{load_default_file_config, resolve_settings};
use cli::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    init_tracing(&args);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Image download aborted: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Priority: `RUST_LOG` env var > quiet flag > verbose flag > default (info).
fn init_tracing(args: &Args) {
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(args: Args) -> Result<()> {
    debug!(?args, "CLI arguments parsed");

    let file_config = load_default_file_config()?;
    let settings = resolve_settings(&args, file_config.as_ref())?;
    debug!(?settings, "settings resolved");

    if !settings.output_dir.is_dir() {
        warn!(
            output_dir = %settings.output_dir.display(),
            "output directory does not exist; every row will fail until it is created"
        );
    }

    let rows = RowSource::open(&settings.input)
        .with_context(|| format!("Failed to read input '{}'", settings.input.display()))?;

    let client =
        HttpClient::new_with_timeouts(settings.connect_timeout_secs, settings.read_timeout_secs);
    let throttle = if settings.delay.is_zero() {
        Throttle::disabled()
    } else {
        Throttle::new(settings.delay)
    };
    let engine = DownloadEngine::new(settings.concurrency, throttle, &settings.output_dir)?;

    info!(
        input = %settings.input.display(),
        output_dir = %settings.output_dir.display(),
        "Image download starting"
    );

    let summary = engine.run(rows, &client, &settings.error_log).await?;

    if summary.failed() > 0 {
        info!(
            error_log = %settings.error_log.display(),
            failed = summary.failed(),
            "Failed rows written to error log"
        );
    }
    Ok(())
}
