//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the batch orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Abort the whole batch on the first failing command.
    ///
    /// When disabled, later commands still run and every failure is
    /// reported at the end.
    #[serde(default = "default_true")]
    pub fail_fast: bool,

    /// Capacity of the progress channel used by front-ends.
    #[serde(default = "default_progress_buffer")]
    pub progress_buffer: usize,
}

fn default_true() -> bool {
    true
}

fn default_progress_buffer() -> usize {
    256
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fail_fast: true,
            progress_buffer: default_progress_buffer(),
        }
    }
}

impl EngineConfig {
    pub fn with_fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.fail_fast);
        assert_eq!(config.progress_buffer, 256);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EngineConfig = toml::from_str("fail_fast = false").unwrap();
        assert!(!config.fail_fast);
        assert_eq!(config.progress_buffer, 256);
    }
}
