//! Error types for scene-bridge configuration handling.
//!
//! Per-connection protocol faults never appear here: they are encoded into
//! the wire envelope (or into `isError` tool results) and the poll loop
//! carries on. These errors are the ones that stop the bridge from coming
//! up at all.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading the bridge configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    Read {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    Parse {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// An explicitly requested configuration file does not exist.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// A setting has a value the bridge cannot run with.
    #[error("configuration validation failed: {message}")]
    Invalid {
        /// Description of the validation failure.
        message: String,
    },
}
