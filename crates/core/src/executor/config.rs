//! Configuration for the filesystem executor.

use serde::{Deserialize, Serialize};

/// Compression used when writing archives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    /// Deflate compression.
    #[default]
    Deflated,
    /// No compression.
    Stored,
}

impl Compression {
    pub(crate) fn method(&self) -> zip::CompressionMethod {
        match self {
            Compression::Deflated => zip::CompressionMethod::Deflated,
            Compression::Stored => zip::CompressionMethod::Stored,
        }
    }
}

/// Configuration for [`FsExecutor`](super::FsExecutor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Buffer size for file copies in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Whether existing destinations are replaced when a job does not say.
    #[serde(default = "default_true")]
    pub overwrite: bool,

    /// Archive compression.
    #[serde(default)]
    pub compression: Compression,
}

fn default_buffer_size() -> usize {
    8 * 1024 * 1024 // 8 MB
}

fn default_true() -> bool {
    true
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            overwrite: true,
            compression: Compression::default(),
        }
    }
}

impl ExecutorConfig {
    /// Sets the buffer size for copies.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Sets the default overwrite behavior.
    pub fn with_overwrite(mut self, enabled: bool) -> Self {
        self.overwrite = enabled;
        self
    }

    /// Sets archive compression.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExecutorConfig::default();
        assert_eq!(config.buffer_size, 8 * 1024 * 1024);
        assert!(config.overwrite);
        assert_eq!(config.compression, Compression::Deflated);
    }

    #[test]
    fn test_config_builder() {
        let config = ExecutorConfig::default()
            .with_buffer_size(1024)
            .with_overwrite(false)
            .with_compression(Compression::Stored);

        assert_eq!(config.buffer_size, 1024);
        assert!(!config.overwrite);
        assert_eq!(config.compression, Compression::Stored);
    }
}
