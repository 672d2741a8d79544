//! Prometheus metrics for the dispatch core.
//!
//! This module provides metrics for:
//! - Jobs executed per command
//! - Commands skipped by the fingerprint cache
//! - Dispatch duration per command and mode

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

/// Jobs executed total by command and result.
pub static JOBS_EXECUTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fileops_jobs_executed_total", "Total jobs executed"),
        &["command", "result"], // result: "success", "failure"
    )
    .unwrap()
});

/// Commands skipped without touching the executor.
pub static COMMANDS_SKIPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fileops_commands_skipped_total", "Total commands skipped"),
        &["command", "reason"], // reason: "empty", "unchanged"
    )
    .unwrap()
});

/// Wall time spent dispatching one command.
pub static DISPATCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "fileops_dispatch_duration_seconds",
            "Duration of a single command dispatch",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0]),
        &["command", "mode"], // mode: "sequential", "parallel"
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_EXECUTED.clone()),
        Box::new(COMMANDS_SKIPPED.clone()),
        Box::new(DISPATCH_DURATION.clone()),
    ]
}
