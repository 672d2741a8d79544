//! Batch orchestrator implementation.
//!
//! Drives a batch command by command, in batch order:
//! - Skip: empty item lists and unchanged item lists (fingerprint cache)
//! - Sequential: one job at a time, in list order
//! - Parallel: handed to the [`ClusterRunner`]

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::batch::{CommandBatch, OptionSet};
use crate::cache::{fingerprint, FingerprintStore};
use crate::dispatcher::{ClusterRunner, DispatchFailure};
use crate::executor::Executor;
use crate::metrics;

use super::config::EngineConfig;
use super::progress::{ProgressSink, ProgressTracker};
use super::types::{
    CommandOutcome, CommandReport, DispatchMode, DispatchUnit, PlannedCommand, RunError,
    RunReport, SkipReason,
};

/// Runs command batches against an executor.
pub struct BatchOrchestrator {
    config: EngineConfig,
    executor: Arc<dyn Executor>,
    store: Arc<dyn FingerprintStore>,
    progress: Option<Arc<dyn ProgressSink>>,
    cluster: ClusterRunner,
}

impl BatchOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: EngineConfig,
        executor: Arc<dyn Executor>,
        store: Arc<dyn FingerprintStore>,
    ) -> Self {
        let cluster = ClusterRunner::new(Arc::clone(&executor));
        Self {
            config,
            executor,
            store,
            progress: None,
            cluster,
        }
    }

    /// Sets the sink that receives progress updates.
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn FingerprintStore> {
        &self.store
    }

    /// Resolves every recognized command in `batch` into a dispatch unit or
    /// a skip, without executing anything.
    pub fn plan(&self, batch: &CommandBatch, global: &OptionSet) -> Vec<PlannedCommand> {
        batch
            .entries()
            .iter()
            .map(|entry| {
                let command = entry.command;
                let options = global.merged_with(&entry.spec.options);

                if entry.spec.items.is_empty() {
                    return PlannedCommand::Skip {
                        command,
                        reason: SkipReason::Empty,
                    };
                }

                let fingerprint = fingerprint(&entry.spec.items);
                if options.cache_enabled()
                    && self.store.get(command).as_deref() == Some(fingerprint.as_str())
                {
                    return PlannedCommand::Skip {
                        command,
                        reason: SkipReason::Unchanged,
                    };
                }

                PlannedCommand::Dispatch(DispatchUnit {
                    command,
                    items: entry.spec.items.clone(),
                    workers: options.worker_count(),
                    options,
                    fingerprint,
                })
            })
            .collect()
    }

    /// Runs every command in `batch`, in order.
    ///
    /// With `fail_fast` (the default) the first failing command ends the
    /// run. Otherwise remaining commands still run and
    /// [`RunError::Incomplete`] carries the full report.
    pub async fn run(
        &self,
        batch: &CommandBatch,
        global: &OptionSet,
    ) -> Result<RunReport, RunError> {
        let started_at = Utc::now();

        for name in batch.ignored() {
            debug!("Ignoring unknown command '{}'", name);
        }

        let plan = self.plan(batch, global);
        let total: usize = plan
            .iter()
            .filter_map(|p| match p {
                PlannedCommand::Dispatch(unit) if unit.tracks_progress() => Some(unit.items.len()),
                _ => None,
            })
            .sum();
        let mut tracker = ProgressTracker::new(self.progress.clone(), total);

        let mut commands = Vec::with_capacity(plan.len());
        for planned in plan {
            let unit = match planned {
                PlannedCommand::Skip { command, reason } => {
                    debug!("Skipping {}: {:?}", command, reason);
                    metrics::COMMANDS_SKIPPED
                        .with_label_values(&[command.as_str(), skip_label(reason)])
                        .inc();
                    commands.push(CommandReport {
                        command,
                        outcome: CommandOutcome::Skipped { reason },
                    });
                    continue;
                }
                PlannedCommand::Dispatch(unit) => unit,
            };

            match self.dispatch(&unit, &mut tracker).await {
                Ok(completed) => {
                    self.store.set(unit.command, unit.fingerprint.clone());
                    commands.push(CommandReport {
                        command: unit.command,
                        outcome: CommandOutcome::Executed {
                            completed,
                            mode: unit.mode(),
                        },
                    });
                }
                Err(failure) if self.config.fail_fast => {
                    error!("Aborting batch: {}", failure);
                    return Err(RunError::CommandFailed(failure));
                }
                Err(failure) => {
                    error!("{}; continuing with remaining commands", failure);
                    commands.push(CommandReport {
                        command: unit.command,
                        outcome: CommandOutcome::Failed {
                            completed: failure.completed,
                            error: failure.to_string(),
                        },
                    });
                }
            }
        }

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            commands,
            ignored: batch.ignored().to_vec(),
        };

        if report.is_success() {
            Ok(report)
        } else {
            Err(RunError::Incomplete {
                report: Box::new(report),
            })
        }
    }

    /// Runs a batch from synchronous code on a private current-thread
    /// runtime.
    ///
    /// Must not be called from within a tokio runtime.
    pub fn run_blocking(
        &self,
        batch: &CommandBatch,
        global: &OptionSet,
    ) -> Result<RunReport, RunError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(RunError::Runtime)?;
        runtime.block_on(self.run(batch, global))
    }

    /// Runs a batch in the background and hands the result to `callback`.
    pub fn run_with_callback<F>(
        self: Arc<Self>,
        batch: CommandBatch,
        global: OptionSet,
        callback: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Result<RunReport, RunError>) + Send + 'static,
    {
        tokio::spawn(async move {
            let result = self.run(&batch, &global).await;
            callback(result);
        })
    }

    async fn dispatch(
        &self,
        unit: &DispatchUnit,
        tracker: &mut ProgressTracker,
    ) -> Result<usize, DispatchFailure> {
        let start = Instant::now();
        let mode = unit.mode();
        info!(
            "Running {} ({} item(s), {})",
            unit.command,
            unit.items.len(),
            mode_label(mode)
        );

        let result = match mode {
            DispatchMode::Sequential => self.run_sequential(unit, tracker).await,
            DispatchMode::Parallel { .. } => {
                let result = self
                    .cluster
                    .run_parallel(&unit.items, unit.workers, unit.command, &unit.options)
                    .await;
                if unit.tracks_progress() {
                    let completed = match &result {
                        Ok(completed) => *completed,
                        Err(failure) => failure.completed,
                    };
                    tracker.advance(unit.command, completed);
                }
                result
            }
        };

        let completed = match &result {
            Ok(completed) => *completed,
            Err(failure) => failure.completed,
        };
        metrics::JOBS_EXECUTED
            .with_label_values(&[unit.command.as_str(), "success"])
            .inc_by(completed as u64);
        metrics::DISPATCH_DURATION
            .with_label_values(&[unit.command.as_str(), mode_label(mode)])
            .observe(start.elapsed().as_secs_f64());

        match &result {
            Ok(completed) => info!(
                "Finished {}: {} item(s) in {}ms",
                unit.command,
                completed,
                start.elapsed().as_millis()
            ),
            Err(_) => metrics::JOBS_EXECUTED
                .with_label_values(&[unit.command.as_str(), "failure"])
                .inc(),
        }

        result
    }

    async fn run_sequential(
        &self,
        unit: &DispatchUnit,
        tracker: &mut ProgressTracker,
    ) -> Result<usize, DispatchFailure> {
        let mut completed = 0;

        for (index, job) in unit.items.iter().enumerate() {
            if let Err(source) = self
                .executor
                .execute(unit.command, job, &unit.options)
                .await
            {
                warn!("{} job #{} failed: {}", unit.command, index, source);
                return Err(DispatchFailure {
                    command: unit.command,
                    index: Some(index),
                    job: Some(job.clone()),
                    completed,
                    source,
                });
            }

            completed += 1;
            if unit.tracks_progress() {
                tracker.advance(unit.command, 1);
            }
        }

        Ok(completed)
    }
}

fn mode_label(mode: DispatchMode) -> &'static str {
    match mode {
        DispatchMode::Sequential => "sequential",
        DispatchMode::Parallel { .. } => "parallel",
    }
}

fn skip_label(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::Empty => "empty",
        SkipReason::Unchanged => "unchanged",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{Command, CommandSpec, Job};
    use crate::cache::MemoryFingerprintStore;
    use crate::orchestrator::ProgressUpdate;
    use crate::testing::{fixtures, MockExecutor};
    use tokio::sync::mpsc;

    struct Harness {
        executor: MockExecutor,
        store: Arc<MemoryFingerprintStore>,
        orchestrator: BatchOrchestrator,
    }

    fn harness(config: EngineConfig) -> Harness {
        let executor = MockExecutor::new();
        let store = Arc::new(MemoryFingerprintStore::new());
        let orchestrator = BatchOrchestrator::new(
            config,
            Arc::new(executor.clone()),
            Arc::clone(&store) as Arc<dyn FingerprintStore>,
        );
        Harness {
            executor,
            store,
            orchestrator,
        }
    }

    #[test]
    fn test_plan_skips_empty_and_cached() {
        let h = harness(EngineConfig::default());
        let copy_items = fixtures::jobs(2);
        h.store.set(Command::Copy, fingerprint(&copy_items));

        let batch = CommandBatch::new()
            .with("copy", CommandSpec::new(copy_items))
            .with("del", CommandSpec::new(vec![]))
            .with("zip", CommandSpec::new(fixtures::jobs(1)));

        let plan = h.orchestrator.plan(&batch, &OptionSet::default());
        assert!(matches!(
            plan[0],
            PlannedCommand::Skip {
                command: Command::Copy,
                reason: SkipReason::Unchanged
            }
        ));
        assert!(matches!(
            plan[1],
            PlannedCommand::Skip {
                command: Command::Del,
                reason: SkipReason::Empty
            }
        ));
        assert!(matches!(&plan[2], PlannedCommand::Dispatch(u) if u.command == Command::Zip));
    }

    #[test]
    fn test_plan_merges_options() {
        let h = harness(EngineConfig::default());
        let batch = CommandBatch::new().with(
            "copy",
            CommandSpec::new(fixtures::jobs(3)).with_options(OptionSet::new().with_parallel(0)),
        );

        let plan = h
            .orchestrator
            .plan(&batch, &OptionSet::new().with_parallel(4).with_progress(true));
        let PlannedCommand::Dispatch(unit) = &plan[0] else {
            panic!("expected dispatch");
        };
        assert_eq!(unit.mode(), DispatchMode::Sequential);
        assert!(unit.tracks_progress());
    }

    #[test]
    fn test_dispatch_unit_mode_clamps_workers() {
        let unit = DispatchUnit {
            command: Command::Copy,
            items: fixtures::jobs(2),
            options: OptionSet::default(),
            fingerprint: String::new(),
            workers: 8,
        };
        assert_eq!(unit.mode(), DispatchMode::Parallel { workers: 2 });
    }

    #[tokio::test]
    async fn test_sequential_failure_counts_prior_items() {
        let h = harness(EngineConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel::<ProgressUpdate>();
        let orchestrator = h.orchestrator.with_progress(Arc::new(tx));
        let items = fixtures::jobs(5);
        h.executor.fail_on(items[3].clone()).await;
        h.store.set(Command::Copy, "previous".to_string());

        let batch = CommandBatch::new().with("copy", CommandSpec::new(items.clone()));
        let err = orchestrator
            .run(&batch, &OptionSet::new().with_progress(true))
            .await
            .unwrap_err();

        let RunError::CommandFailed(failure) = err else {
            panic!("expected CommandFailed");
        };
        assert_eq!(failure.index, Some(3));
        assert_eq!(failure.completed, 3);
        assert_eq!(h.executor.jobs_for(Command::Copy).await, items[..4].to_vec());

        let mut last = 0;
        while let Ok(update) = rx.try_recv() {
            assert_eq!(update.total, 5);
            last = update.completed;
        }
        assert_eq!(last, 3);
        assert_eq!(h.store.get(Command::Copy), Some("previous".to_string()));
    }

    #[tokio::test]
    async fn test_parallel_progress_reported_once() {
        let h = harness(EngineConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel::<ProgressUpdate>();
        let orchestrator = h.orchestrator.with_progress(Arc::new(tx));

        let batch = CommandBatch::new().with("zip", CommandSpec::new(fixtures::jobs(6)));
        let report = orchestrator
            .run(&batch, &OptionSet::new().with_parallel(3).with_progress(true))
            .await
            .unwrap();

        assert_eq!(
            report.outcome(Command::Zip),
            Some(&CommandOutcome::Executed {
                completed: 6,
                mode: DispatchMode::Parallel { workers: 3 }
            })
        );
        let update = rx.try_recv().unwrap();
        assert_eq!((update.delta, update.completed, update.total), (6, 6, 6));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_progress_disabled_emits_nothing() {
        let h = harness(EngineConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel::<ProgressUpdate>();
        let orchestrator = h.orchestrator.with_progress(Arc::new(tx));

        let batch = CommandBatch::new().with("del", CommandSpec::new(fixtures::jobs(2)));
        orchestrator.run(&batch, &OptionSet::default()).await.unwrap();

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_continue_mode_runs_later_commands() {
        let h = harness(EngineConfig::default().with_fail_fast(false));
        let bad = Job::from("bad");
        h.executor.fail_on(bad.clone()).await;

        let batch = CommandBatch::new()
            .with("unzip", CommandSpec::new(vec![bad]))
            .with("del", CommandSpec::new(fixtures::jobs(2)));
        let err = h
            .orchestrator
            .run(&batch, &OptionSet::default())
            .await
            .unwrap_err();

        let RunError::Incomplete { report } = err else {
            panic!("expected Incomplete");
        };
        assert!(matches!(
            report.outcome(Command::Unzip),
            Some(CommandOutcome::Failed { completed: 0, .. })
        ));
        assert_eq!(report.executed().collect::<Vec<_>>(), vec![Command::Del]);
        assert_eq!(h.executor.jobs_for(Command::Del).await.len(), 2);
        assert_eq!(h.store.get(Command::Unzip), None);
        assert!(h.store.get(Command::Del).is_some());
    }

    #[tokio::test]
    async fn test_run_with_callback() {
        let h = harness(EngineConfig::default());
        let orchestrator = Arc::new(h.orchestrator);
        let (tx, rx) = tokio::sync::oneshot::channel();

        let batch = CommandBatch::new().with("rename", CommandSpec::new(fixtures::jobs(2)));
        let handle = orchestrator.run_with_callback(batch, OptionSet::default(), move |result| {
            let _ = tx.send(result.map(|r| r.total_completed()));
        });

        assert_eq!(rx.await.unwrap().unwrap(), 2);
        handle.await.unwrap();
    }

    #[test]
    fn test_run_blocking() {
        let h = harness(EngineConfig::default());
        let batch = CommandBatch::new().with("copy", CommandSpec::new(fixtures::jobs(3)));

        let report = h
            .orchestrator
            .run_blocking(&batch, &OptionSet::default())
            .unwrap();
        assert_eq!(report.total_completed(), 3);
        assert_eq!(tokio_test::block_on(h.executor.call_count()), 3);
    }
}
