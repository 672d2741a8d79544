use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use prometheus::{Encoder, Registry, TextEncoder};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fileops_core::{
    load_batch, load_config, load_config_or_default, metrics, shared_store, validate_config,
    BatchOrchestrator, Config, FingerprintStore, FsExecutor, LogProgress, ProgressSink,
    ProgressUpdate, RunError, RunReport,
};

/// Config file used when `FILEOPS_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "fileops.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Some(batch_path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        bail!("usage: fileops <batch-file>");
    };

    let config = resolve_config()?;
    validate_config(&config).context("Configuration validation failed")?;

    let registry = Registry::new();
    for metric in metrics::all_metrics() {
        registry
            .register(metric)
            .context("Failed to register metrics")?;
    }

    info!("Loading batch from {:?}", batch_path);
    let batch = load_batch(&batch_path)
        .with_context(|| format!("Failed to load batch from {:?}", batch_path))?;
    info!(
        "Batch has {} command(s), {} ignored",
        batch.len(),
        batch.ignored().len()
    );

    let executor = Arc::new(FsExecutor::new(config.executor.clone()));
    let (progress_tx, progress_rx) = mpsc::channel(config.engine.progress_buffer);
    let progress_handle = tokio::spawn(log_progress(progress_rx));

    let orchestrator = BatchOrchestrator::new(
        config.engine.clone(),
        executor,
        shared_store() as Arc<dyn FingerprintStore>,
    )
    .with_progress(Arc::new(progress_tx));

    let result = orchestrator.run(&batch, &config.defaults).await;

    // Dropping the orchestrator closes the progress channel.
    drop(orchestrator);
    if let Err(e) = progress_handle.await {
        warn!("Progress logger did not finish: {}", e);
    }

    dump_metrics(&registry);

    match result {
        Ok(report) => {
            log_report(&report);
            Ok(())
        }
        Err(RunError::Incomplete { report }) => {
            log_report(&report);
            for failure in report.failures() {
                error!("{}: {:?}", failure.command, failure.outcome);
            }
            bail!("{} of {} command(s) failed", report.failures().count(), report.commands.len())
        }
        Err(e) => Err(e).context("Batch aborted"),
    }
}

/// Loads `FILEOPS_CONFIG` if set. Otherwise `fileops.toml` is optional and
/// `FILEOPS_*` overrides apply on top of the defaults.
fn resolve_config() -> Result<Config> {
    if let Ok(path) = std::env::var("FILEOPS_CONFIG") {
        let config_path = PathBuf::from(path);
        info!("Loading configuration from {:?}", config_path);
        return load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path));
    }

    let config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if !config_path.exists() {
        info!("No {} found, using defaults", DEFAULT_CONFIG_PATH);
    }
    load_config_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))
}

/// Drains the progress channel so logging stays off the dispatch path.
async fn log_progress(mut rx: mpsc::Receiver<ProgressUpdate>) {
    let sink = LogProgress;
    while let Some(update) = rx.recv().await {
        sink.advance(update);
    }
}

fn log_report(report: &RunReport) {
    for command in &report.commands {
        info!("{}: {:?}", command.command, command.outcome);
    }
    info!(
        "Completed {} job(s) in {}ms ({} executed, {} skipped)",
        report.total_completed(),
        report.duration_ms(),
        report.executed().count(),
        report.skipped().count()
    );
}

fn dump_metrics(registry: &Registry) {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&registry.gather(), &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
        return;
    }
    debug!("Metrics:\n{}", String::from_utf8_lossy(&buffer));
}
