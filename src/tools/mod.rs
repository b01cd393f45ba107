//! The three tool handlers and their shared dispatch.
//!
//! Handlers return `Result<String, ToolError>`; [`dispatch`] converts that
//! into the uniform [`ToolCallResult`] wire shape. A handler failure is an
//! application-level outcome carried inside a successful envelope — only
//! the outer protocol layer uses numeric error codes.

pub mod describe_model;
pub mod execute_code;
pub mod export_scene;

use std::io;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::bridge::protocol::ToolCallResult;
use crate::config::ExportConfig;
use crate::host::{Host, HostError};

/// Application-level failures a tool call can report.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool does not exist.
    #[error("Unknown tool: {name}")]
    UnknownTool {
        /// The tool name as requested.
        name: String,
    },

    /// `execute_code` was called without code.
    #[error("No code provided")]
    NoCode,

    /// A tool needing the scene was called with no model open.
    #[error("No active model")]
    NoActiveModel,

    /// `export_scene` was asked for a format the bridge does not support.
    #[error("Unsupported format: {format}. Valid formats: skp, png, jpg")]
    UnsupportedFormat {
        /// The format as requested.
        format: String,
    },

    /// A requested raster dimension is outside the configured limits.
    #[error("{name} must be between 1 and {max}")]
    DimensionOutOfRange {
        /// "Width" or "Height".
        name: &'static str,
        /// Configured upper bound.
        max: u32,
    },

    /// An argument had the wrong shape or type.
    #[error("Invalid arguments: {message}")]
    InvalidArguments {
        /// Description of the problem.
        message: String,
    },

    /// The export scratch directory could not be created.
    #[error("failed to create export directory {path}")]
    ExportDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The host facade reported a fault. Carries the host's own
    /// diagnostic text, including raw scripting-engine messages.
    #[error(transparent)]
    Host(#[from] HostError),

    /// A tool result could not be encoded.
    #[error("failed to encode result")]
    Encode(#[from] serde_json::Error),
}

/// Routes a tool call by name and folds the outcome into the wire shape.
pub fn dispatch(
    host: &mut dyn Host,
    export: &ExportConfig,
    name: &str,
    arguments: &Value,
) -> ToolCallResult {
    let outcome = match name {
        "execute_code" => execute_code::run(host, arguments),
        "describe_model" => describe_model::run(host, arguments),
        "export_scene" => export_scene::run(host, export, arguments),
        _ => Err(ToolError::UnknownTool {
            name: name.to_string(),
        }),
    };

    match outcome {
        Ok(text) => ToolCallResult::text(text),
        Err(e) => {
            debug!(tool = name, error = %e, "tool call failed");
            ToolCallResult::error(e.to_string())
        }
    }
}
