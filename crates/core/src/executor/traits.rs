//! Trait definitions for the executor module.

use async_trait::async_trait;

use super::error::ExecutorError;
use crate::batch::{Command, Job, OptionSet};

/// Performs the file operation behind each command.
///
/// Each method handles exactly one job. `options` is the merged option set
/// for the command, including any pass-through keys.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Returns the name of this executor implementation.
    fn name(&self) -> &str;

    async fn copy(&self, job: &Job, options: &OptionSet) -> Result<(), ExecutorError>;

    async fn move_path(&self, job: &Job, options: &OptionSet) -> Result<(), ExecutorError>;

    async fn delete(&self, job: &Job, options: &OptionSet) -> Result<(), ExecutorError>;

    async fn zip(&self, job: &Job, options: &OptionSet) -> Result<(), ExecutorError>;

    async fn unzip(&self, job: &Job, options: &OptionSet) -> Result<(), ExecutorError>;

    async fn rename(&self, job: &Job, options: &OptionSet) -> Result<(), ExecutorError>;

    /// Runs one job for `command`.
    async fn execute(
        &self,
        command: Command,
        job: &Job,
        options: &OptionSet,
    ) -> Result<(), ExecutorError> {
        match command {
            Command::Copy => self.copy(job, options).await,
            Command::Move => self.move_path(job, options).await,
            Command::Del => self.delete(job, options).await,
            Command::Zip => self.zip(job, options).await,
            Command::Unzip => self.unzip(job, options).await,
            Command::Rename => self.rename(job, options).await,
        }
    }
}
