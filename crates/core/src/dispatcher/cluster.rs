//! Cluster runner: fans one command's jobs out across worker tasks.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::types::{partition, DispatchFailure, Partition};
use crate::batch::{Command, Job, OptionSet};
use crate::executor::{Executor, ExecutorError};

/// Messages sent from a worker to the coordinator.
#[derive(Debug)]
enum WorkerEvent {
    Completed {
        worker: usize,
        index: usize,
    },
    Failed {
        worker: usize,
        index: usize,
        job: Job,
        error: ExecutorError,
    },
}

/// Runs a command's jobs on a fixed set of workers.
///
/// Workers are spawned per call and torn down when the call returns. Each
/// worker owns one contiguous slice and runs it in order; there is no work
/// stealing.
pub struct ClusterRunner {
    executor: Arc<dyn Executor>,
}

impl ClusterRunner {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    /// Executes every job in `items` for `command` across up to
    /// `worker_count` workers and returns how many completed.
    ///
    /// When a job fails its worker stops, and the remaining workers finish
    /// the job they are on before stopping. The returned failure carries the
    /// number of jobs that did complete.
    pub async fn run_parallel(
        &self,
        items: &[Job],
        worker_count: usize,
        command: Command,
        options: &OptionSet,
    ) -> Result<usize, DispatchFailure> {
        let partitions = partition(items, worker_count);
        if partitions.is_empty() {
            return Ok(0);
        }

        debug!(
            "Dispatching {} {} job(s) across {} worker(s)",
            items.len(),
            command,
            partitions.len()
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let abort = Arc::new(AtomicBool::new(false));

        let mut handles = Vec::with_capacity(partitions.len());
        for slice in partitions {
            let worker = slice.worker;
            let task = run_worker(
                slice,
                command,
                Arc::clone(&self.executor),
                options.clone(),
                Arc::clone(&abort),
                tx.clone(),
            );
            handles.push((worker, tokio::spawn(task)));
        }
        // Only workers hold senders now, so `recv` ends when the last one exits.
        drop(tx);

        let mut completed = 0;
        let mut failure: Option<(Option<usize>, Option<Job>, ExecutorError)> = None;

        while let Some(event) = rx.recv().await {
            match event {
                WorkerEvent::Completed { .. } => completed += 1,
                WorkerEvent::Failed {
                    worker,
                    index,
                    job,
                    error,
                } => {
                    warn!(
                        "Worker {} failed {} job #{}: {}",
                        worker, command, index, error
                    );
                    abort.store(true, Ordering::SeqCst);
                    if failure.is_none() {
                        failure = Some((Some(index), Some(job), error));
                    }
                }
            }
        }

        for (worker, handle) in handles {
            if let Err(e) = handle.await {
                warn!("Worker {} for {} did not finish: {}", worker, command, e);
                if failure.is_none() {
                    failure = Some((None, None, ExecutorError::TaskFailed(e.to_string())));
                }
            }
        }

        match failure {
            None => Ok(completed),
            Some((index, job, source)) => Err(DispatchFailure {
                command,
                index,
                job,
                completed,
                source,
            }),
        }
    }
}

async fn run_worker(
    slice: Partition,
    command: Command,
    executor: Arc<dyn Executor>,
    options: OptionSet,
    abort: Arc<AtomicBool>,
    tx: mpsc::UnboundedSender<WorkerEvent>,
) {
    let worker = slice.worker;

    for (position, job) in slice.jobs.into_iter().enumerate() {
        if abort.load(Ordering::SeqCst) {
            debug!("Worker {} stopping, run aborted", worker);
            return;
        }

        let index = slice.offset + position;
        let outcome = AssertUnwindSafe(executor.execute(command, &job, &options))
            .catch_unwind()
            .await;

        let error = match outcome {
            Ok(Ok(())) => {
                if tx.send(WorkerEvent::Completed { worker, index }).is_err() {
                    return;
                }
                continue;
            }
            Ok(Err(error)) => error,
            Err(panic) => ExecutorError::Failed(format!(
                "executor panicked: {}",
                panic_message(panic.as_ref())
            )),
        };

        // Siblings must see the abort before their next job, not whenever
        // the coordinator gets around to reading this event.
        abort.store(true, Ordering::SeqCst);
        let _ = tx.send(WorkerEvent::Failed {
            worker,
            index,
            job,
            error,
        });
        return;
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
