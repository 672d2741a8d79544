use std::path::Path;

use super::{types::CommandBatch, BatchError};

/// Load a batch from a `.json` or `.toml` file.
pub fn load_batch(path: &Path) -> Result<CommandBatch, BatchError> {
    if !path.exists() {
        return Err(BatchError::FileNotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse_batch_json(&content),
        Some("toml") => parse_batch_toml(&content),
        _ => Err(BatchError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Parse a batch from a JSON document.
pub fn parse_batch_json(json: &str) -> Result<CommandBatch, BatchError> {
    serde_json::from_str(json).map_err(|e| BatchError::ParseError(e.to_string()))
}

/// Parse a batch from a TOML document.
pub fn parse_batch_toml(toml_str: &str) -> Result<CommandBatch, BatchError> {
    toml::from_str(toml_str).map_err(|e| BatchError::ParseError(e.to_string()))
}
