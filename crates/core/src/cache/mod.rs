//! Result cache used to skip commands whose item list has not changed.
//!
//! A command's item list is reduced to a fingerprint (SHA-256 of its
//! canonical JSON). After a command runs to completion its fingerprint is
//! stored; the next run with an identical list is skipped.

mod fingerprint;
mod store;

pub use fingerprint::{canonical_json, fingerprint};
pub use store::{shared_store, FingerprintStore, MemoryFingerprintStore};
