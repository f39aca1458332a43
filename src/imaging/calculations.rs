//! Pure calculation functions for image dimensions and placement.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{Opacity, Position, ResizeScale, Rotation, WatermarkScale};

/// Size of the watermark after applying its scale percentage.
///
/// Each edge is truncated and never drops below one pixel.
///
/// # Examples
/// ```
/// # use imgtool::imaging::{WatermarkScale, scaled_watermark_size};
/// assert_eq!(scaled_watermark_size((200, 100), WatermarkScale::new(50)), (100, 50));
/// assert_eq!(scaled_watermark_size((15, 15), WatermarkScale::new(10)), (1, 1));
/// ```
pub fn scaled_watermark_size(size: (u32, u32), scale: WatermarkScale) -> (u32, u32) {
    let (w, h) = size;
    let s = scale.value() as u64;
    (
        ((w as u64 * s) / 100).max(1) as u32,
        ((h as u64 * s) / 100).max(1) as u32,
    )
}

/// Top-left offset at which an overlay of size `overlay` is pasted into a
/// base of size `base`.
///
/// Signed: an overlay larger than the base gets a negative offset on that
/// axis and is clipped when pasted.
pub fn watermark_origin(position: Position, base: (u32, u32), overlay: (u32, u32)) -> (i64, i64) {
    let (bw, bh) = (base.0 as i64, base.1 as i64);
    let (ow, oh) = (overlay.0 as i64, overlay.1 as i64);
    match position {
        Position::TopLeft => (0, 0),
        Position::TopRight => (bw - ow, 0),
        Position::BottomLeft => (0, bh - oh),
        Position::BottomRight => (bw - ow, bh - oh),
    }
}

/// Multiply an alpha value by the opacity percentage.
pub fn scale_alpha(alpha: u8, opacity: Opacity) -> u8 {
    let scaled = (alpha as u32 * opacity.value() + 50) / 100;
    scaled.min(255) as u8
}

/// Dimensions after shrinking by a percentage, aspect ratio preserved.
///
/// # Examples
/// ```
/// # use imgtool::imaging::{ResizeScale, scaled_dimensions};
/// assert_eq!(scaled_dimensions((1920, 1080), ResizeScale::new(50)), (960, 540));
/// ```
pub fn scaled_dimensions(size: (u32, u32), scale: ResizeScale) -> (u32, u32) {
    let (w, h) = size;
    let s = scale.value() as u64;
    (
        ((w as u64 * s) / 100).max(1) as u32,
        ((h as u64 * s) / 100).max(1) as u32,
    )
}

/// Largest size with the source aspect ratio that fits inside `bounds`.
///
/// Never upscales: a source already inside the bounds is returned as-is.
/// Each edge is at least 1, so a zero bound behaves like a bound of 1.
pub fn fit_within(size: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = size;
    let (max_w, max_h) = (bounds.0.max(1), bounds.1.max(1));
    if src_w <= max_w && src_h <= max_h {
        return size;
    }

    let ratio = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    (
        ((src_w as f64 * ratio).round() as u32).clamp(1, max_w),
        ((src_h as f64 * ratio).round() as u32).clamp(1, max_h),
    )
}

/// Dimensions after a quarter-turn rotation.
pub fn rotated_dimensions(size: (u32, u32), rotation: Rotation) -> (u32, u32) {
    match rotation {
        Rotation::Cw90 | Rotation::Cw270 => (size.1, size.0),
        Rotation::Cw180 => size,
    }
}

/// Completion percentage after `done` of `total` items, truncated.
///
/// An empty batch is complete.
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}
