//! Testing utilities and mock implementations.
//!
//! This module provides a mock [`Executor`](crate::executor::Executor) and
//! fixtures so the orchestrator and dispatcher can be exercised without
//! touching the file system.
//!
//! # Example
//!
//! ```rust,ignore
//! use fileops_core::testing::{fixtures, MockExecutor};
//!
//! let executor = MockExecutor::new();
//! let batch = fixtures::batch(&[("copy", fixtures::jobs(3))]);
//!
//! // Run the batch with an orchestrator built on `executor`...
//! ```

mod mock_executor;

pub use mock_executor::{MockExecutor, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::json;
    use std::path::Path;

    use crate::batch::{CommandBatch, CommandSpec, Job};

    /// `n` distinct bare-path jobs: `job-0`, `job-1`, ...
    pub fn jobs(n: usize) -> Vec<Job> {
        (0..n).map(|i| Job::from(format!("job-{}", i).as_str())).collect()
    }

    /// Jobs from literal path strings.
    pub fn named(names: &[&str]) -> Vec<Job> {
        names.iter().map(|n| Job::from(*n)).collect()
    }

    /// A `{source, destination}` job.
    pub fn path_pair(source: impl AsRef<Path>, destination: impl AsRef<Path>) -> Job {
        Job::new(json!({
            "source": source.as_ref().to_string_lossy(),
            "destination": destination.as_ref().to_string_lossy(),
        }))
    }

    /// A batch with default options for every command.
    pub fn batch(entries: &[(&str, Vec<Job>)]) -> CommandBatch {
        entries
            .iter()
            .fold(CommandBatch::new(), |batch, (name, items)| {
                batch.with(name, CommandSpec::new(items.clone()))
            })
    }
}
