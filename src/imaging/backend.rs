//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the operations every backend must
//! support: identify, watermark, compress, crop, resize and rotate. Each
//! operation reads its `source`, does the pixel work and writes `output`.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use a recording mock.

use super::params::{CompressParams, CropParams, ResizeParams, RotateParams, WatermarkParams};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("Failed to encode {path}: {reason}")]
    Encode { path: PathBuf, reason: String },
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("Invalid region: {0}")]
    InvalidRegion(String),
}

impl BackendError {
    pub(crate) fn decode(path: &Path, reason: impl ToString) -> Self {
        BackendError::Decode {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn encode(path: &Path, reason: impl ToString) -> Self {
        BackendError::Encode {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Trait for image processing backends.
///
/// `Sync` so a backend can be shared with the batch worker thread.
pub trait ImageBackend: Sync {
    /// Get image dimensions without decoding pixels.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Paste the (already decoded) watermark into a corner of the source.
    ///
    /// `watermark` is loaded once per batch and reused for every image.
    fn watermark(
        &self,
        watermark: &image::RgbaImage,
        params: &WatermarkParams,
    ) -> Result<Dimensions, BackendError>;

    /// Re-encode with explicit JPEG quality / PNG compression.
    fn compress(&self, params: &CompressParams) -> Result<Dimensions, BackendError>;

    /// Cut a region out of the source.
    fn crop(&self, params: &CropParams) -> Result<Dimensions, BackendError>;

    /// Resize to exact dimensions.
    fn resize(&self, params: &ResizeParams) -> Result<Dimensions, BackendError>;

    /// Rotate clockwise by quarter turns.
    fn rotate(&self, params: &RotateParams) -> Result<Dimensions, BackendError>;
}
