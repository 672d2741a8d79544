//! Executor module: the file operations behind each command.
//!
//! The dispatch core only ever talks to the [`Executor`] trait, one job at a
//! time. [`FsExecutor`] is the implementation that touches the local file
//! system; tests substitute [`MockExecutor`](crate::testing::MockExecutor).
//!
//! # Job shapes (FsExecutor)
//!
//! - `copy`, `move`, `rename`, `zip`, `unzip`: `{"source": ..., "destination": ...}`
//!   with an optional per-job `"overwrite"`
//! - `del`: a bare path string or `{"path": ...}`
//!
//! # Example
//!
//! ```ignore
//! use fileops_core::executor::{Executor, FsExecutor};
//! use fileops_core::batch::{Command, Job, OptionSet};
//!
//! let executor = FsExecutor::with_defaults();
//! let job = Job::new(serde_json::json!({"source": "dist", "destination": "dist.zip"}));
//! executor.execute(Command::Zip, &job, &OptionSet::default()).await?;
//! ```

mod config;
mod error;
mod fs_executor;
mod traits;
mod types;

pub use config::{Compression, ExecutorConfig};
pub use error::ExecutorError;
pub use fs_executor::FsExecutor;
pub use traits::Executor;
pub use types::{DeleteTarget, PathPair};
