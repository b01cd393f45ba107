//! Configuration file loading and parsing.
//!
//! This module handles loading the configuration file from disk and parsing
//! it into validated, type-safe structures.
//!
//! # Configuration File Locations
//!
//! The configuration file is searched in the following order:
//!
//! 1. Path specified via the CLI argument
//! 2. Default location:
//!    - **Linux/macOS:** `~/.scene-bridge/config.json`
//!    - **Windows:** `%USERPROFILE%\.scene-bridge\config.json`
//!
//! The file is optional: when no path is given and the default location does
//! not exist, built-in defaults apply (the shared secret still comes from the
//! `SCENE_BRIDGE_SECRET` environment variable).

mod settings;

pub use settings::{
    AuthConfig, Config, ExportConfig, LoggingConfig, NetworkConfig, SECRET_ENV_VAR,
};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Returns the default configuration directory.
///
/// - **Linux/macOS:** `~/.scene-bridge/`
/// - **Windows:** `%USERPROFILE%\.scene-bridge\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".scene-bridge"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Returns the directory exported scenes are written to.
///
/// Uses the configured directory when present, otherwise
/// `~/.scene-bridge/exports`, otherwise a directory under the system temp
/// dir.
#[must_use]
pub fn export_dir(export: &ExportConfig) -> PathBuf {
    export.directory.clone().unwrap_or_else(|| {
        default_config_dir()
            .map_or_else(|| std::env::temp_dir().join("scene-bridge"), |p| p)
            .join("exports")
    })
}

/// Loads and parses the configuration file.
///
/// If `path` is `None`, uses the platform-specific default location; a
/// missing default file yields the built-in defaults. An explicitly given
/// path must exist.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly specified file cannot be found
/// - The file cannot be read
/// - The JSON is malformed
/// - Required fields are missing or invalid
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound {
                    path: p.to_path_buf(),
                });
            }
            p.to_path_buf()
        }
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => {
                let config = Config::default();
                config.validate()?;
                return Ok(config);
            }
        },
    };

    let contents = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Read {
        path: config_path.clone(),
        source: e,
    })?;

    let config: Config = serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: config_path.clone(),
        source: e,
    })?;

    // Validate the configuration
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_dir_exists() {
        assert!(default_config_dir().is_some());
    }

    #[test]
    fn default_config_path_exists() {
        let path = default_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("config.json"));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let result = load_config(Some(Path::new("/nonexistent/config.json")));
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn configured_export_dir_wins() {
        let export = ExportConfig {
            directory: Some(PathBuf::from("/var/exports")),
            ..ExportConfig::default()
        };
        assert_eq!(export_dir(&export), PathBuf::from("/var/exports"));
    }

    #[test]
    fn fallback_export_dir_ends_with_exports() {
        let export = ExportConfig::default();
        assert!(export_dir(&export).ends_with("exports"));
    }
}
