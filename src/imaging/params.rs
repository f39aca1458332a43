//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! and the [`backend`](super::backend), which does the actual pixel work.
//! Swapping in a mock backend for tests needs no change to operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG quality (1–100, default 50). Clamped on construction.
//! - [`PngCompression`]: PNG compression level (0–9, default 3).
//! - [`Opacity`]: watermark opacity in percent (0–100, default 100).
//! - [`WatermarkScale`]: watermark scale in percent (10–300, default 100).
//! - [`ResizeScale`]: resize factor in percent (10–100, default 100).
//! - [`Position`]: which corner the watermark is pasted into.
//! - [`Rotation`]: clockwise quarter turns.
//! - [`OutputFormat`]: encoder chosen from the output file extension.

use super::backend::BackendError;
use crate::selection::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Quality setting for lossy JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(50)
    }
}

impl From<u32> for Quality {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u32 {
    fn from(q: Quality) -> Self {
        q.0
    }
}

/// PNG compression level, 0 (fastest) to 9 (smallest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct PngCompression(u32);

impl PngCompression {
    pub fn new(level: u32) -> Self {
        Self(level.min(9))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for PngCompression {
    fn default() -> Self {
        Self(3)
    }
}

impl From<u32> for PngCompression {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<PngCompression> for u32 {
    fn from(c: PngCompression) -> Self {
        c.0
    }
}

/// Watermark opacity in percent. 0 is invisible, 100 keeps the watermark's
/// own alpha channel untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Opacity(u32);

impl Opacity {
    pub fn new(percent: u32) -> Self {
        Self(percent.min(100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self(100)
    }
}

impl From<u32> for Opacity {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Opacity> for u32 {
    fn from(o: Opacity) -> Self {
        o.0
    }
}

/// Watermark scale in percent of its native size (10-300).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct WatermarkScale(u32);

impl WatermarkScale {
    pub fn new(percent: u32) -> Self {
        Self(percent.clamp(10, 300))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for WatermarkScale {
    fn default() -> Self {
        Self(100)
    }
}

impl From<u32> for WatermarkScale {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<WatermarkScale> for u32 {
    fn from(s: WatermarkScale) -> Self {
        s.0
    }
}

/// Downscale factor in percent (10-100). The resize tool only shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct ResizeScale(u32);

impl ResizeScale {
    pub fn new(percent: u32) -> Self {
        Self(percent.clamp(10, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for ResizeScale {
    fn default() -> Self {
        Self(100)
    }
}

impl From<u32> for ResizeScale {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<ResizeScale> for u32 {
    fn from(s: ResizeScale) -> Self {
        s.0
    }
}

/// Corner of the base image the watermark is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::TopLeft,
        Position::TopRight,
        Position::BottomLeft,
        Position::BottomRight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Position::TopLeft => "top-left",
            Position::TopRight => "top-right",
            Position::BottomLeft => "bottom-left",
            Position::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown position '{s}' (expected top-left, top-right, bottom-left or bottom-right)")
            })
    }
}

/// Clockwise rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// Build from a number of clockwise quarter turns. A multiple of four is
    /// the identity and yields `None`.
    pub fn from_turns(turns: u32) -> Option<Self> {
        match turns % 4 {
            1 => Some(Rotation::Cw90),
            2 => Some(Rotation::Cw180),
            3 => Some(Rotation::Cw270),
            _ => None,
        }
    }

    /// Build from degrees. Only multiples of 90 are accepted; negative values
    /// rotate counter-clockwise.
    pub fn from_degrees(degrees: i32) -> Result<Option<Self>, String> {
        if degrees % 90 != 0 {
            return Err(format!("rotation must be a multiple of 90 degrees, got {degrees}"));
        }
        Ok(Self::from_turns((degrees / 90).rem_euclid(4) as u32))
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }
}

/// Encoder used to write an output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg,
    Bmp,
}

impl OutputFormat {
    /// Infer the format from the extension of `path` (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, BackendError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "bmp" => Ok(OutputFormat::Bmp),
            other => Err(BackendError::UnsupportedFormat(format!(
                "'{}' ({})",
                other,
                path.display()
            ))),
        }
    }
}

/// Paste a watermark into one corner of `source`, writing a PNG to `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub position: Position,
    pub opacity: Opacity,
    pub scale: WatermarkScale,
}

/// Re-encode `source` into `output` with explicit quality knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub quality: Quality,
    pub png_compression: PngCompression,
}

/// Cut `region` (image pixel coordinates) out of `source`.
#[derive(Debug, Clone, PartialEq)]
pub struct CropParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub region: Rect,
}

/// Resize `source` to exactly `width` x `height`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Rotate `source` clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct RotateParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub rotation: Rotation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn defaults_match_tool_presets() {
        assert_eq!(Quality::default().value(), 50);
        assert_eq!(PngCompression::default().value(), 3);
        assert_eq!(Opacity::default().value(), 100);
        assert_eq!(WatermarkScale::default().value(), 100);
        assert_eq!(ResizeScale::default().value(), 100);
        assert_eq!(Position::default(), Position::BottomRight);
    }

    #[test]
    fn scales_clamp() {
        assert_eq!(WatermarkScale::new(1).value(), 10);
        assert_eq!(WatermarkScale::new(500).value(), 300);
        assert_eq!(ResizeScale::new(5).value(), 10);
        assert_eq!(ResizeScale::new(200).value(), 100);
        assert_eq!(Opacity::new(101).value(), 100);
        assert_eq!(PngCompression::new(12).value(), 9);
    }

    #[test]
    fn position_parses_case_insensitively() {
        assert_eq!("Top-Left".parse::<Position>(), Ok(Position::TopLeft));
        assert_eq!(" bottom-right ".parse::<Position>(), Ok(Position::BottomRight));
        assert!("center".parse::<Position>().is_err());
    }

    #[test]
    fn position_display_roundtrips() {
        for p in Position::ALL {
            assert_eq!(p.to_string().parse::<Position>(), Ok(p));
        }
    }

    #[test]
    fn rotation_from_turns_wraps() {
        assert_eq!(Rotation::from_turns(1), Some(Rotation::Cw90));
        assert_eq!(Rotation::from_turns(4), None);
        assert_eq!(Rotation::from_turns(7), Some(Rotation::Cw270));
    }

    #[test]
    fn rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(180), Ok(Some(Rotation::Cw180)));
        assert_eq!(Rotation::from_degrees(-90), Ok(Some(Rotation::Cw270)));
        assert_eq!(Rotation::from_degrees(360), Ok(None));
        assert!(Rotation::from_degrees(45).is_err());
    }

    #[test]
    fn output_format_from_extension() {
        assert_eq!(
            OutputFormat::from_path(Path::new("a/b.PNG")).unwrap(),
            OutputFormat::Png
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("x.jpeg")).unwrap(),
            OutputFormat::Jpeg
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("x.bmp")).unwrap(),
            OutputFormat::Bmp
        );
        assert!(OutputFormat::from_path(Path::new("x.gif")).is_err());
        assert!(OutputFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn quality_deserializes_with_clamp() {
        #[derive(Deserialize)]
        struct Wrap {
            q: Quality,
        }
        let w: Wrap = toml::from_str("q = 400").unwrap();
        assert_eq!(w.q.value(), 100);
    }
}
