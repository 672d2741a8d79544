//! Storage for the last successful fingerprint of each command.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::batch::Command;

/// Remembers, per command, the fingerprint of the last item list that ran
/// to completion.
pub trait FingerprintStore: Send + Sync {
    /// Returns the stored fingerprint for a command, if any.
    fn get(&self, command: Command) -> Option<String>;

    /// Records the fingerprint of a successful run.
    fn set(&self, command: Command, fingerprint: String);
}

/// In-memory fingerprint store. Nothing is persisted.
#[derive(Debug, Default)]
pub struct MemoryFingerprintStore {
    entries: RwLock<HashMap<Command, String>>,
}

impl MemoryFingerprintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commands with a stored fingerprint.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every stored fingerprint.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl FingerprintStore for MemoryFingerprintStore {
    fn get(&self, command: Command) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&command)
            .cloned()
    }

    fn set(&self, command: Command, fingerprint: String) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(command, fingerprint);
    }
}

static SHARED_STORE: Lazy<Arc<MemoryFingerprintStore>> =
    Lazy::new(|| Arc::new(MemoryFingerprintStore::new()));

/// The process-wide store, shared by every caller that does not bring its own.
pub fn shared_store() -> Arc<MemoryFingerprintStore> {
    Arc::clone(&SHARED_STORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let store = MemoryFingerprintStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get(Command::Copy), None);

        store.set(Command::Copy, "abc".to_string());
        assert_eq!(store.get(Command::Copy), Some("abc".to_string()));
        assert_eq!(store.get(Command::Del), None);

        store.set(Command::Copy, "def".to_string());
        assert_eq!(store.get(Command::Copy), Some("def".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear() {
        let store = MemoryFingerprintStore::new();
        store.set(Command::Zip, "abc".to_string());
        store.clear();
        assert_eq!(store.get(Command::Zip), None);
    }

    #[test]
    fn test_shared_store_is_single_instance() {
        assert!(Arc::ptr_eq(&shared_store(), &shared_store()));
    }
}
