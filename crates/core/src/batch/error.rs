//! Error types for loading batches.

use thiserror::Error;

/// Errors raised while reading a batch description.
///
/// These always surface before any command is executed.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Batch file not found.
    #[error("Batch file not found: {0}")]
    FileNotFound(String),

    /// File extension is not a supported batch format.
    #[error("Unsupported batch format: {0} (expected .json or .toml)")]
    UnsupportedFormat(String),

    /// Batch content could not be parsed.
    #[error("Failed to parse batch: {0}")]
    ParseError(String),

    /// I/O error while reading the batch.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
