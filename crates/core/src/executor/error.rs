//! Error types for the executor module.

use std::path::PathBuf;
use thiserror::Error;

use crate::batch::Command;

/// Errors that can occur while executing a single job.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The job does not have the shape the command expects.
    #[error("Invalid {command} job: {reason}")]
    InvalidJob { command: Command, reason: String },

    /// Source path not found.
    #[error("Source not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Destination already exists and overwrite is disabled.
    #[error("Destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    /// Failed to create a directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to copy a file.
    #[error("Failed to copy {source} to {destination}")]
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to move or rename a path.
    #[error("Failed to move {source} to {destination}")]
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to delete a path.
    #[error("Failed to delete {path}")]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read or write an archive.
    #[error("Archive error for {path}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Source and destination resolve to the same path.
    #[error("Source and destination are the same path: {path}")]
    SamePath { path: PathBuf },

    /// Archive entry would be written outside the destination.
    #[error("Archive entry escapes destination: {entry}")]
    UnsafeArchiveEntry { entry: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    TaskFailed(String),

    /// Executor-specific failure.
    #[error("{0}")]
    Failed(String),
}

impl ExecutorError {
    /// Creates an invalid job error.
    pub fn invalid_job(command: Command, reason: impl Into<String>) -> Self {
        Self::InvalidJob {
            command,
            reason: reason.into(),
        }
    }

    /// Creates a copy failed error.
    pub fn copy_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::CopyFailed {
            source,
            destination,
            error,
        }
    }

    /// Creates a move failed error.
    pub fn move_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::MoveFailed {
            source,
            destination,
            error,
        }
    }
}
