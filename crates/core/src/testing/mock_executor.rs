//! Mock executor for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::batch::{Command, Job, OptionSet};
use crate::executor::{Executor, ExecutorError};

/// A recorded executor call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub command: Command,
    pub job: Job,
    pub options: OptionSet,
}

/// Mock implementation of the Executor trait.
///
/// Provides controllable behavior for testing:
/// - Records every call, in the order calls started
/// - Fails (or panics) on chosen jobs
/// - Simulates per-call latency
/// - Tracks the peak number of calls in flight
///
/// Clones share state, so a clone can be handed to the orchestrator while
/// the test keeps another for assertions.
///
/// # Example
///
/// ```rust,ignore
/// use fileops_core::testing::MockExecutor;
///
/// let executor = MockExecutor::new();
/// executor.fail_on(Job::from("b")).await;
///
/// // Run a batch...
///
/// assert_eq!(executor.jobs_for(Command::Copy).await, vec![Job::from("a"), Job::from("b")]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockExecutor {
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    failing_jobs: Arc<RwLock<Vec<Job>>>,
    panicking_jobs: Arc<RwLock<Vec<Job>>>,
    call_duration_ms: Arc<RwLock<u64>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

/// Decrements the in-flight counter even if the call panics.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockExecutor {
    /// Create a new mock executor. Calls succeed immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// Get the number of calls made.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Jobs passed for `command`, in the order the calls started.
    pub async fn jobs_for(&self, command: Command) -> Vec<Job> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.command == command)
            .map(|c| c.job.clone())
            .collect()
    }

    /// Clear recorded calls.
    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    /// Make every call for `job` fail.
    pub async fn fail_on(&self, job: Job) {
        self.failing_jobs.write().await.push(job);
    }

    /// Make every call for `job` panic.
    pub async fn panic_on(&self, job: Job) {
        self.panicking_jobs.write().await.push(job);
    }

    /// Clear configured failures and panics.
    pub async fn clear_failures(&self) {
        self.failing_jobs.write().await.clear();
        self.panicking_jobs.write().await.clear();
    }

    /// Set the simulated duration of each call.
    pub async fn set_call_duration(&self, duration: Duration) {
        *self.call_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Highest number of calls observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn handle(
        &self,
        command: Command,
        job: &Job,
        options: &OptionSet,
    ) -> Result<(), ExecutorError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlightGuard(&self.in_flight);
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        self.calls.write().await.push(RecordedCall {
            command,
            job: job.clone(),
            options: options.clone(),
        });

        let duration_ms = *self.call_duration_ms.read().await;
        if duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        }

        if self.panicking_jobs.read().await.contains(job) {
            panic!("mock executor asked to panic on {job}");
        }

        if self.failing_jobs.read().await.contains(job) {
            return Err(ExecutorError::Failed(format!(
                "mock {command} failure for {job}"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Executor for MockExecutor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn copy(&self, job: &Job, options: &OptionSet) -> Result<(), ExecutorError> {
        self.handle(Command::Copy, job, options).await
    }

    async fn move_path(&self, job: &Job, options: &OptionSet) -> Result<(), ExecutorError> {
        self.handle(Command::Move, job, options).await
    }

    async fn delete(&self, job: &Job, options: &OptionSet) -> Result<(), ExecutorError> {
        self.handle(Command::Del, job, options).await
    }

    async fn zip(&self, job: &Job, options: &OptionSet) -> Result<(), ExecutorError> {
        self.handle(Command::Zip, job, options).await
    }

    async fn unzip(&self, job: &Job, options: &OptionSet) -> Result<(), ExecutorError> {
        self.handle(Command::Unzip, job, options).await
    }

    async fn rename(&self, job: &Job, options: &OptionSet) -> Result<(), ExecutorError> {
        self.handle(Command::Rename, job, options).await
    }
}
