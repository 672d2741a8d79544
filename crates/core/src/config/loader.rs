use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides
///
/// Nested keys use a double underscore, e.g. `FILEOPS_ENGINE__FAIL_FAST=false`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    extract(Figment::new().merge(Toml::file(path)))
}

/// Like [`load_config`], but a missing file falls back to the defaults.
/// Environment overrides apply either way.
pub fn load_config_or_default(path: &Path) -> Result<Config, ConfigError> {
    let figment = if path.exists() {
        Figment::new().merge(Toml::file(path))
    } else {
        Figment::new()
    };

    extract(figment)
}

fn extract(figment: Figment) -> Result<Config, ConfigError> {
    figment
        .merge(Env::prefixed("FILEOPS_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Compression;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[defaults]
parallel = 4
progress = true
overwrite = false

[engine]
fail_fast = false

[executor]
compression = "stored"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.defaults.worker_count(), 4);
        assert!(config.defaults.progress_enabled());
        assert!(config.defaults.cache_enabled());
        assert_eq!(config.defaults.get_bool("overwrite"), Some(false));
        assert!(!config.engine.fail_fast);
        assert_eq!(config.executor.compression, Compression::Stored);
    }

    #[test]
    fn test_load_config_from_str_empty_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.defaults.worker_count(), 0);
        assert!(config.engine.fail_fast);
        assert_eq!(config.executor.buffer_size, 8 * 1024 * 1024);
    }

    #[test]
    fn test_load_config_from_str_invalid() {
        let toml = r#"
[defaults]
parallel = "lots"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/fileops.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "fileops.toml",
                r#"
[engine]
fail_fast = true

[executor]
buffer_size = 4096
"#,
            )?;
            jail.set_env("FILEOPS_ENGINE__FAIL_FAST", "false");

            let config = load_config(Path::new("fileops.toml")).map_err(|e| e.to_string())?;
            assert!(!config.engine.fail_fast);
            assert_eq!(config.executor.buffer_size, 4096);
            Ok(())
        });
    }

    #[test]
    fn test_missing_optional_file_still_applies_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("FILEOPS_EXECUTOR__BUFFER_SIZE", "1024");
            jail.set_env("FILEOPS_DEFAULTS__CACHE", "false");

            let config =
                load_config_or_default(Path::new("fileops.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.executor.buffer_size, 1024);
            assert!(!config.defaults.cache_enabled());
            assert!(config.engine.fail_fast);
            Ok(())
        });
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[defaults]
parallel = true

[executor]
buffer_size = 4096
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert!(config.defaults.worker_count() >= 1);
        assert_eq!(config.executor.buffer_size, 4096);
    }
}
