//! Batch file operations with cached, optionally parallel dispatch.
//!
//! A [`CommandBatch`] lists jobs for up to six commands (`copy`, `move`,
//! `del`, `zip`, `unzip`, `rename`). The [`BatchOrchestrator`] runs them in
//! batch order, skipping commands whose item list has not changed since
//! the last successful run, and fanning jobs out across workers when a
//! `parallel` worker count is set.

pub mod batch;
pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod executor;
pub mod metrics;
pub mod orchestrator;
pub mod testing;

pub use batch::{
    load_batch, parse_batch_json, parse_batch_toml, BatchError, Command, CommandBatch,
    CommandSpec, Job, OptionSet, Parallelism,
};
pub use cache::{fingerprint, shared_store, FingerprintStore, MemoryFingerprintStore};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError,
};
pub use dispatcher::{ClusterRunner, DispatchFailure};
pub use executor::{Compression, Executor, ExecutorConfig, ExecutorError, FsExecutor};
pub use orchestrator::{
    BatchOrchestrator, CommandOutcome, DispatchMode, EngineConfig, LogProgress, ProgressSink,
    ProgressUpdate, RunError, RunReport, SkipReason,
};
