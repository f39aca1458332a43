//! High-level image operations.
//!
//! These functions combine calculations with backend execution. They take
//! user-level settings, compute parameters, call the backend and return an
//! [`OperationReport`] for display.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{fit_within, rotated_dimensions, scaled_dimensions};
use super::params::{
    CompressParams, CropParams, PngCompression, Quality, ResizeParams, ResizeScale, RotateParams,
    Rotation,
};
use crate::selection::{Rect, map_view_to_image};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// What a single-image tool did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationReport {
    pub tool: &'static str,
    pub source: PathBuf,
    pub output: PathBuf,
    pub input: Dimensions,
    pub result: Dimensions,
    pub input_bytes: u64,
    pub output_bytes: u64,
}

fn file_len(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

fn report(
    tool: &'static str,
    source: &Path,
    output: &Path,
    input: Dimensions,
    result: Dimensions,
) -> OperationReport {
    OperationReport {
        tool,
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        input,
        result,
        input_bytes: file_len(source),
        output_bytes: file_len(output),
    }
}

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    Ok(backend.identify(path)?.as_tuple())
}

/// Re-encode an image with the given quality knobs. The output extension
/// picks JPEG or PNG.
pub fn compress_image(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    quality: Quality,
    png_compression: PngCompression,
) -> Result<OperationReport> {
    let result = backend.compress(&CompressParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        quality,
        png_compression,
    })?;
    let report = report("compress", source, output, result, result);
    info!(
        quality = quality.value(),
        before = report.input_bytes,
        after = report.output_bytes,
        "compressed {}",
        source.display()
    );
    Ok(report)
}

/// Crop using a rectangle in image pixels.
pub fn crop_image(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    region: Rect,
) -> Result<OperationReport> {
    let input = backend.identify(source)?;
    let result = backend.crop(&CropParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        region,
    })?;
    Ok(report("crop", source, output, input, result))
}

/// Crop using a selection drawn on a preview of size `view`.
///
/// The selection is mapped onto the full-size image first.
pub fn crop_view_selection(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    selection: Rect,
    view: (u32, u32),
) -> Result<OperationReport> {
    let input = backend.identify(source)?;
    let region = map_view_to_image(selection, view, input.as_tuple())
        .map_err(|e| BackendError::InvalidRegion(e.to_string()))?;
    let result = backend.crop(&CropParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        region,
    })?;
    Ok(report("crop", source, output, input, result))
}

/// How to size the resize output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeTarget {
    /// Shrink both edges by a percentage.
    Scale(ResizeScale),
    /// Shrink to fit a bounding box, aspect ratio preserved.
    Fit { width: u32, height: u32 },
}

/// Plan a resize without executing it.
pub fn plan_resize(
    source: &Path,
    output: &Path,
    original: (u32, u32),
    target: ResizeTarget,
) -> ResizeParams {
    let (width, height) = match target {
        ResizeTarget::Scale(scale) => scaled_dimensions(original, scale),
        ResizeTarget::Fit { width, height } => fit_within(original, (width, height)),
    };
    ResizeParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
    }
}

/// Resize an image, preserving its aspect ratio.
///
/// A [`ResizeTarget::Fit`] box with a zero edge is rejected.
pub fn resize_image(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    target: ResizeTarget,
) -> Result<OperationReport> {
    if let ResizeTarget::Fit { width, height } = target {
        if width == 0 || height == 0 {
            return Err(BackendError::InvalidRegion(format!(
                "cannot fit inside an empty {width}x{height} box"
            )));
        }
    }
    let input = backend.identify(source)?;
    let params = plan_resize(source, output, input.as_tuple(), target);
    let result = backend.resize(&params)?;
    Ok(report("resize", source, output, input, result))
}

/// Rotate an image clockwise.
pub fn rotate_image(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    rotation: Rotation,
) -> Result<OperationReport> {
    let input = backend.identify(source)?;
    backend.rotate(&RotateParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        rotation,
    })?;
    let result = Dimensions::from(rotated_dimensions(input.as_tuple(), rotation));
    Ok(report("rotate", source, output, input, result))
}
