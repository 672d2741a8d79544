use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Executor copy buffer is not empty
/// - Progress channel has capacity
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.executor.buffer_size == 0 {
        return Err(ConfigError::ValidationError(
            "executor.buffer_size cannot be 0".to_string(),
        ));
    }

    if config.engine.progress_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "engine.progress_buffer cannot be 0".to_string(),
        ));
    }

    Ok(())
}
