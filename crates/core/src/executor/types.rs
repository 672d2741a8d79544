//! Job shapes understood by the filesystem executor.

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ExecutorError;
use crate::batch::{Command, Job, OptionSet};

/// A job that reads from one path and writes to another.
///
/// Used by `copy`, `move`, `rename`, `zip` and `unzip`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PathPair {
    #[serde(alias = "src")]
    pub source: PathBuf,
    #[serde(alias = "dest")]
    pub destination: PathBuf,
    /// Per-job overwrite override.
    #[serde(default)]
    pub overwrite: Option<bool>,
}

impl PathPair {
    pub(crate) fn from_job(command: Command, job: &Job) -> Result<Self, ExecutorError> {
        serde_json::from_value(job.as_value().clone())
            .map_err(|e| ExecutorError::invalid_job(command, format!("{e} in {job}")))
    }

    /// Resolves overwrite: the job wins, then the command options, then the
    /// executor default.
    pub(crate) fn overwrite(&self, options: &OptionSet, default: bool) -> bool {
        self.overwrite
            .or_else(|| options.get_bool("overwrite"))
            .unwrap_or(default)
    }
}

/// A `del` job: either a bare path or `{path}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DeleteTarget {
    Path(PathBuf),
    Object { path: PathBuf },
}

impl DeleteTarget {
    pub(crate) fn from_job(job: &Job) -> Result<Self, ExecutorError> {
        serde_json::from_value(job.as_value().clone()).map_err(|_| {
            ExecutorError::invalid_job(
                Command::Del,
                format!("expected a path or {{\"path\": ...}}, got {job}"),
            )
        })
    }

    pub fn path(&self) -> &PathBuf {
        match self {
            DeleteTarget::Path(path) | DeleteTarget::Object { path } => path,
        }
    }
}
