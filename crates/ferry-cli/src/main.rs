#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use std::process;

use anyhow::Context;
use ferry_storage::azure::AzureConnector;
use ferry_transfer::IngestionService;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "ferry_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "ferry_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "ferry_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SHUTDOWN,
            "Transfer run finished"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %format!("{error:#}"),
            "Transfer run failed"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();
    telemetry::init_tracing(cli.log_format)?;

    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "Starting ferry"
    );
    cli.log();

    let connector = AzureConnector::from_config(&cli.http, &cli.credentials)
        .context("failed to create storage connector")?;

    let service = IngestionService::new(
        connector,
        cli.accounts.source_account_url.clone(),
        cli.accounts.target_account_url.clone(),
    )
    .with_options(cli.options.clone());

    let report = service
        .ingest(&cli.transfer)
        .await
        .context("transfer run aborted")?;

    let rendered = serde_json::to_string_pretty(&report).context("failed to render report")?;
    println!("{rendered}");

    if cli.strict {
        report
            .into_result()
            .context("some objects were not transferred")?;
    }

    Ok(())
}
