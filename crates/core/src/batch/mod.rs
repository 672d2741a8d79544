//! Batch descriptions: which commands to run, on which jobs, with which
//! options.
//!
//! A batch maps command names to `{items, options}` and keeps the order the
//! commands were written in, since later commands often depend on the side
//! effects of earlier ones (an `unzip` before a `del`, for instance).
//!
//! # Example
//!
//! ```ignore
//! use fileops_core::batch::parse_batch_json;
//!
//! let batch = parse_batch_json(r#"{
//!     "copy": {"items": [{"source": "assets", "destination": "dist/assets"}]},
//!     "zip":  {"items": [{"source": "dist", "destination": "dist.zip"}]}
//! }"#)?;
//! ```

mod error;
mod loader;
mod types;

pub use error::BatchError;
pub use loader::{load_batch, parse_batch_json, parse_batch_toml};
pub use types::{BatchEntry, Command, CommandBatch, CommandSpec, Job, OptionSet, Parallelism};
