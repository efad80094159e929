mod archive;
mod classifier;
mod cli;
mod config;
mod engine;
mod error;
mod helpers;
mod ingest;
mod planner;
mod report;
mod session;

use std::process::ExitCode;

use anyhow::Context;
use archive::ArchiveLedger;
use clap::{CommandFactory, Parser};
use cli::Cli;
use config::ConfigStore;
use engine::CommandRunner;
use error::SetupError;
use helpers::dependencies::{self, Tool};
use ingest::UrlNormalizer;
use session::DownloadSession;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{filter::Builder as TracingFilterBuilder, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    match dotenvy::dotenv() {
        Err(e) if e.not_found() => {}
        Ok(_) => {}
        Err(e) => {
            eprintln!("Failed to load .env file: {}", e);
            return ExitCode::FAILURE;
        }
    }

    init_log();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            if let Some(setup) = e.downcast_ref::<SetupError>() {
                error!("{}", setup);
                eprintln!("{}", setup.remediation());
            } else {
                error!("{:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut store = ConfigStore::from_env();
    let mut config = store.load().await;

    if cli.show_config {
        println!("{}", config.display());
        return Ok(ExitCode::SUCCESS);
    }

    if cli.reset {
        let config = store.reset().await.context("Failed to reset configuration")?;
        info!(path = ?store.path(), "Configuration reset to defaults");
        println!("{}", config.display());
        return Ok(ExitCode::SUCCESS);
    }

    if cli.sources.is_empty() {
        Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    }

    config.apply_cli(&cli);
    debug!(?config, "Effective configuration");

    let downloader = Tool::downloader();
    dependencies::check(&[downloader.clone(), Tool::ffmpeg()]).await?;

    let batch = UrlNormalizer::normalize(&cli.sources);
    for warning in &batch.warnings {
        warn!(source = %warning.source, "{}", warning.message);
    }
    if batch.is_empty() {
        return Err(SetupError::NoUrls.into());
    }
    info!("Found {} unique URL(s)", batch.urls.len());

    let mut ledger = ArchiveLedger::open(config.archive_file.as_deref()).await;
    if let Some(path) = ledger.path() {
        info!(
            path = ?path,
            "Archive holds {} previously downloaded URL(s)",
            ledger.len()
        );
    }

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|source| SetupError::OutputDir {
            path: config.output_dir.clone(),
            source,
        })?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let runner = CommandRunner;
    let report = DownloadSession::new(
        &config,
        &downloader.program,
        &runner,
        &mut ledger,
        cancel,
    )
    .run(&batch.urls)
    .await;

    println!("{report}");

    if let Err(e) = store.save(&config).await {
        warn!(?e, "Failed to save configuration");
    }

    Ok(ExitCode::SUCCESS)
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            warn!("Interrupt received, stopping after the current download");
            cancel.cancel();
        }
        Err(e) => debug!(?e, "Could not listen for interrupts"),
    }
}

fn init_log() {
    tracing_subscriber::fmt()
        .with_ansi(true)
        .with_env_filter(
            TracingFilterBuilder::default()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .finish()
        .init();
}
