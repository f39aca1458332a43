//! Tool preferences.
//!
//! Defaults for every tool live in an optional TOML file. Command-line flags
//! override file values; file values override stock defaults.
//!
//! ## Lookup
//!
//! 1. `--config FILE` if given (must exist)
//! 2. `imgtool.toml` in the current directory, if present
//! 3. stock defaults
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [watermark]
//! position = "bottom-right"  # top-left | top-right | bottom-left | bottom-right
//! opacity = 100              # 0-100 percent
//! scale = 100                # 10-300 percent of the watermark's size
//! recursive = false          # also watermark images in subfolders
//!
//! [compress]
//! quality = 50               # JPEG quality 1-100
//! png_compression = 3        # PNG level 0-9
//!
//! [resize]
//! scale = 100                # 10-100 percent
//!
//! [output]
//! jpeg_quality = 95          # JPEG quality for crop/resize/rotate/screenshot
//!
//! [screenshot]
//! command = []               # e.g. ["grim", "{output}"]
//! device_pixel_ratio = 1.0
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Opacity, PngCompression, Position, Quality, ResizeScale, WatermarkScale};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "imgtool.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// All tool preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    pub watermark: WatermarkConfig,
    pub compress: CompressConfig,
    pub resize: ResizeConfig,
    pub output: OutputConfig,
    pub screenshot: ScreenshotConfig,
}

impl ToolConfig {
    /// Validate values serde cannot clamp on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dpr = self.screenshot.device_pixel_ratio;
        if !dpr.is_finite() || dpr <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "screenshot.device_pixel_ratio must be positive, got {dpr}"
            )));
        }
        if self
            .screenshot
            .command
            .first()
            .is_some_and(|p| p.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "screenshot.command must start with a program name".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkConfig {
    pub position: Position,
    pub opacity: Opacity,
    pub scale: WatermarkScale,
    pub recursive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressConfig {
    pub quality: Quality,
    pub png_compression: PngCompression,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub scale: ResizeScale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub jpeg_quality: Quality,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: Quality::new(95),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScreenshotConfig {
    /// Capture program and arguments; `{output}` is the file to write.
    pub command: Vec<String>,
    pub device_pixel_ratio: f64,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            device_pixel_ratio: 1.0,
        }
    }
}

// =============================================================================
// Loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(ToolConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Parse config text, merged over the stock defaults and validated.
pub fn parse_config(text: &str) -> Result<ToolConfig, ConfigError> {
    let overlay: toml::Value = toml::from_str(text)?;
    let merged = merge_toml(stock_defaults_value()?, overlay);
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config at `path`.
pub fn load_config_file(path: &Path) -> Result<ToolConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded config");
    parse_config(&text)
}

/// Resolve the config: explicit path, then `imgtool.toml` in `cwd`, then
/// defaults.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<ToolConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_config_file(path);
    }
    let local = cwd.join(DEFAULT_CONFIG_FILE);
    if local.is_file() {
        return load_config_file(&local);
    }
    Ok(ToolConfig::default())
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgtool configuration
# =====================
# Save as imgtool.toml in the working directory or pass --config FILE.
# Every key is optional; command-line flags override these values.

[watermark]
# Corner the watermark is anchored to:
# "top-left", "top-right", "bottom-left" or "bottom-right".
position = "bottom-right"
# Opacity in percent (0 = invisible, 100 = the watermark's own alpha).
opacity = 100
# Watermark size in percent of its native size (10-300).
scale = 100
# Also process images in subfolders of the input folder.
recursive = false

[compress]
# JPEG quality (1-100). Lower is smaller.
quality = 50
# PNG compression level (0-9). Higher is smaller and slower.
png_compression = 3

[resize]
# Default downscale in percent (10-100).
scale = 100

[output]
# JPEG quality used when crop/resize/rotate/screenshot write a .jpg.
jpeg_quality = 95

[screenshot]
# External capture program. "{output}" is replaced with the file to write;
# without it the path is appended. Examples:
#   command = ["grim", "{output}"]                 # Wayland
#   command = ["scrot", "--overwrite", "{output}"] # X11
#   command = ["screencapture", "-x", "{output}"]  # macOS
command = []
# Physical pixels per logical point (2.0 on most HiDPI displays).
device_pixel_ratio = 1.0
"##
}
