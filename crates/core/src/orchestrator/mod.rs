//! Batch orchestrator.
//!
//! The orchestrator walks a [`CommandBatch`](crate::batch::CommandBatch) in
//! order and, for each recognized command:
//! - **Merges** the command's options over the global ones
//! - **Skips** empty item lists and lists whose fingerprint matches the last
//!   successful run
//! - **Dispatches** sequentially, or through the cluster runner when a
//!   worker count is set
//! - **Records** the fingerprint once every job has succeeded
//!
//! Commands never interleave; a command only starts once the previous one
//! has finished.

mod config;
mod progress;
mod runner;
mod types;

pub use config::EngineConfig;
pub use progress::{LogProgress, ProgressSink, ProgressUpdate};
pub use runner::BatchOrchestrator;
pub use types::{
    CommandOutcome, CommandReport, DispatchMode, DispatchUnit, PlannedCommand, RunError,
    RunReport, SkipReason,
};
