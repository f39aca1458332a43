//! Image processing on top of the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Watermark** | Lanczos3 resize + alpha fade + `imageops::overlay` |
//! | **Compress** | JPEG quality / PNG compression level |
//! | **Crop / Resize / Rotate** | `DynamicImage` transforms |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and placement math
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    fit_within, progress_percent, rotated_dimensions, scale_alpha, scaled_dimensions,
    scaled_watermark_size, watermark_origin,
};
pub use operations::{
    OperationReport, ResizeTarget, compress_image, crop_image, crop_view_selection,
    get_dimensions, plan_resize, resize_image, rotate_image,
};
pub use params::{
    CompressParams, CropParams, Opacity, OutputFormat, PngCompression, Position, Quality,
    ResizeParams, ResizeScale, RotateParams, Rotation, WatermarkParams, WatermarkScale,
};
pub use rust_backend::{RustBackend, load_image};
