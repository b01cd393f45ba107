//! `export_scene` — persist the model or render the active view to a file.
//!
//! Exactly one file is written per call, named
//! `export_<YYYYMMDD_HHMMSS>.<ext>` inside the scratch export directory.
//! Prior exports are left alone unless a retention cap is configured
//! (`export.keep_last`), in which case the oldest exports beyond the cap
//! are pruned after each successful call.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use super::ToolError;
use crate::config::{self, ExportConfig};
use crate::host::{Host, RenderOptions};

/// Prefix shared by every exported filename.
const EXPORT_FILE_PREFIX: &str = "export_";

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportFormat {
    /// Native model format: the whole model is saved.
    Native,
    /// PNG raster render of the active view, with alpha.
    Png,
    /// JPEG raster render of the active view.
    Jpg,
}

impl ExportFormat {
    /// Parses the caller-supplied format, case-insensitively.
    /// `jpeg` is accepted as an alias of `jpg`.
    fn parse(format: &str) -> Result<Self, ToolError> {
        match format.to_ascii_lowercase().as_str() {
            "skp" => Ok(Self::Native),
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            _ => Err(ToolError::UnsupportedFormat {
                format: format.to_string(),
            }),
        }
    }

    const fn extension(self) -> &'static str {
        match self {
            Self::Native => "skp",
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }

    const fn is_raster(self) -> bool {
        matches!(self, Self::Png | Self::Jpg)
    }
}

/// Reads an optional raster dimension argument, applying the configured
/// default and limits.
fn raster_dimension(
    arguments: &Value,
    key: &str,
    label: &'static str,
    default: u32,
    max: u32,
) -> Result<u32, ToolError> {
    match arguments.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => {
            let n = value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or(ToolError::DimensionOutOfRange { name: label, max })?;
            if n == 0 || n > max {
                return Err(ToolError::DimensionOutOfRange { name: label, max });
            }
            Ok(n)
        }
    }
}

/// Exports the model and returns the resolved file path as text.
pub(crate) fn run(
    host: &mut dyn Host,
    export: &ExportConfig,
    arguments: &Value,
) -> Result<String, ToolError> {
    let format_arg = arguments
        .get("format")
        .and_then(Value::as_str)
        .unwrap_or("skp");
    let format = ExportFormat::parse(format_arg)?;

    let width = raster_dimension(
        arguments,
        "width",
        "Width",
        export.default_image_width,
        export.max_image_dimension,
    )?;
    let height = raster_dimension(
        arguments,
        "height",
        "Height",
        export.default_image_height,
        export.max_image_dimension,
    )?;

    let model = host.active_model().ok_or(ToolError::NoActiveModel)?;

    let dir = config::export_dir(export);
    std::fs::create_dir_all(&dir).map_err(|e| ToolError::ExportDir {
        path: dir.clone(),
        source: e,
    })?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!(
        "{EXPORT_FILE_PREFIX}{timestamp}.{}",
        format.extension()
    ));

    let text = if format.is_raster() {
        let options = RenderOptions {
            width,
            height,
            antialias: true,
            transparent: format == ExportFormat::Png,
        };
        model.render_view(&path, &options)?;
        info!(path = %path.display(), width, height, "exported view render");
        format!("Exported to: {} ({width}x{height})", path.display())
    } else {
        model.save_as(&path)?;
        info!(path = %path.display(), "exported model");
        format!("Exported to: {}", path.display())
    };

    if let Some(keep) = export.keep_last {
        prune_exports(&dir, keep);
    }

    Ok(text)
}

/// Removes the oldest exports beyond the retention cap. Failures are
/// logged and never fail the export that triggered the pruning.
fn prune_exports(dir: &Path, keep: usize) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "failed to scan export directory");
            return;
        }
    };

    let mut exports: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(EXPORT_FILE_PREFIX))
        })
        .collect();

    if exports.len() <= keep {
        return;
    }

    // Timestamped names sort chronologically
    exports.sort();
    let excess = exports.len() - keep;
    for path in exports.drain(..excess) {
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "pruned old export"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to prune old export"),
        }
    }
}
