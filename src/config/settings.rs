//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable consulted for the shared authentication secret.
pub const SECRET_ENV_VAR: &str = "SCENE_BRIDGE_SECRET";

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Listener settings.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Shared-secret authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Scene export settings.
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.port == 0 {
            return Err(ConfigError::Invalid {
                message: "network.port must be non-zero".to_string(),
            });
        }

        if self.network.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                message: "network.tick_interval_ms must be non-zero".to_string(),
            });
        }

        if self.export.max_image_dimension == 0 {
            return Err(ConfigError::Invalid {
                message: "export.max_image_dimension must be non-zero".to_string(),
            });
        }

        for (name, value) in [
            ("export.default_image_width", self.export.default_image_width),
            (
                "export.default_image_height",
                self.export.default_image_height,
            ),
        ] {
            if value == 0 || value > self.export.max_image_dimension {
                return Err(ConfigError::Invalid {
                    message: format!(
                        "{name} must be between 1 and {}",
                        self.export.max_image_dimension
                    ),
                });
            }
        }

        if self.export.keep_last == Some(0) {
            return Err(ConfigError::Invalid {
                message: "export.keep_last must be at least 1 when set".to_string(),
            });
        }

        Ok(())
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// Address the listener binds to. Loopback by convention; the bridge
    /// grants unrestricted scripting access to anyone who can connect.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Listener port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Interval between poll ticks in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Read timeout for a single request line in milliseconds.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            tick_interval_ms: default_tick_interval_ms(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    9876
}

const fn default_tick_interval_ms() -> u64 {
    50
}

const fn default_read_timeout_ms() -> u64 {
    2000
}

/// Shared-secret authentication configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Shared secret the client must present before its request line.
    /// An absent or empty secret disables authentication entirely.
    #[serde(default = "secret_from_env")]
    pub secret: Option<String>,

    /// When `true`, a failed authentication closes the connection without
    /// writing anything back. When `false`, an error envelope is written
    /// before closing.
    #[serde(default = "default_true")]
    pub silent_rejection: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: secret_from_env(),
            silent_rejection: default_true(),
        }
    }
}

impl AuthConfig {
    /// Returns the configured secret, treating an empty string as disabled.
    #[must_use]
    pub fn effective_secret(&self) -> Option<&str> {
        self.secret.as_deref().filter(|s| !s.is_empty())
    }
}

fn secret_from_env() -> Option<String> {
    std::env::var(SECRET_ENV_VAR).ok().filter(|s| !s.is_empty())
}

/// Scene export configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Directory exported files are written to. Defaults to
    /// `~/.scene-bridge/exports`, falling back to the system temp dir.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Default image width in pixels for raster exports.
    #[serde(default = "default_image_width")]
    pub default_image_width: u32,

    /// Default image height in pixels for raster exports.
    #[serde(default = "default_image_height")]
    pub default_image_height: u32,

    /// Upper bound for requested image dimensions.
    #[serde(default = "default_max_image_dimension")]
    pub max_image_dimension: u32,

    /// Retention cap: keep only the newest N exports. Absent means exports
    /// accumulate without cleanup.
    #[serde(default)]
    pub keep_last: Option<usize>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: None,
            default_image_width: default_image_width(),
            default_image_height: default_image_height(),
            max_image_dimension: default_max_image_dimension(),
            keep_last: None,
        }
    }
}

const fn default_image_width() -> u32 {
    1920
}

const fn default_image_height() -> u32 {
    1080
}

const fn default_max_image_dimension() -> u32 {
    8192
}

const fn default_true() -> bool {
    true
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
