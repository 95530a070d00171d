pub mod clean;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod io_utils;
pub mod loader;
pub mod metrics;
pub mod observe;
pub mod pipeline;
pub mod preview;
pub mod sink;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, PreviewArgs, RunArgs},
    config::ConfigFile,
    observe::LogObserver,
};

pub use crate::error::EtlError;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sales_fact_etl", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => handle_run(&args),
        Commands::Preview(args) => handle_preview(&args),
    }
}

fn handle_run(args: &RunArgs) -> Result<()> {
    let base = match &args.config {
        Some(path) => ConfigFile::load(path)
            .with_context(|| format!("Loading configuration from {path:?}"))?,
        None => ConfigFile::default(),
    };
    let config = base
        .merge(args.overrides())
        .resolve()
        .context("Resolving pipeline configuration")?;
    debug!("Resolved configuration: {config:?}");
    info!(
        "Processing '{}' with delimiter '{}'",
        config.input.display(),
        io_utils::printable_delimiter(io_utils::resolve_input_delimiter(
            &config.input,
            config.delimiter
        ))
    );
    let summary = pipeline::run(&config, &LogObserver)
        .with_context(|| format!("Running pipeline for {:?}", config.input))?;
    info!(
        "Fact table holds {} row(s) ({} loaded, {} duplicate(s), {} invalid)",
        summary.sink.rows_written,
        summary.rows_loaded,
        summary.clean.duplicates_removed,
        summary.clean.invalid_removed
    );
    Ok(())
}

fn handle_preview(args: &PreviewArgs) -> Result<()> {
    let observer = LogObserver;
    let raw = pipeline::load(
        &args.input,
        args.delimiter,
        args.input_encoding.as_deref(),
        &observer,
    )
    .with_context(|| format!("Loading {:?}", args.input))?;
    let (table, _, _) = pipeline::transform(raw, &observer)
        .with_context(|| format!("Transforming {:?}", args.input))?;
    print!("{}", preview::render(&table, args.rows));
    info!(
        "Displayed {} of {} row(s) from {:?}",
        args.rows.min(table.row_count()),
        table.row_count(),
        args.input
    );
    Ok(())
}
