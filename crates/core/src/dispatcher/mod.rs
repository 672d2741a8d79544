//! Parallel dispatcher for a single command's jobs.
//!
//! [`ClusterRunner`] splits a job list into contiguous slices, one per
//! worker, and runs each slice on its own tokio task. The coordinator only
//! reads completion and failure events from a channel the workers own, so
//! no counter is shared between workers.
//!
//! Failure handling is graceful: the failing worker raises a shared abort
//! flag and stops, the others finish the job in hand and then stop.

mod cluster;
mod types;

pub use cluster::ClusterRunner;
pub use types::{partition, DispatchFailure, Partition};
