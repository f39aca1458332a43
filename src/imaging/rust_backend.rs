//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, BMP) | `image::ImageReader` |
//! | Watermark | `imageops::resize` (Lanczos3) + alpha scaling + `imageops::overlay` |
//! | Compress → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |
//! | Compress → PNG | `image::codecs::png::PngEncoder::new_with_quality` |
//! | Crop | `DynamicImage::crop_imm` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Rotate | `DynamicImage::rotate90` / `rotate180` / `rotate270` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{scale_alpha, scaled_watermark_size, watermark_origin};
use super::params::{
    CompressParams, CropParams, OutputFormat, PngCompression, Quality, ResizeParams,
    RotateParams, Rotation, WatermarkParams,
};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageEncoder, ImageReader, RgbaImage};
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, instrument};

/// JPEG quality used when a tool other than `compress` writes a JPEG.
const DEFAULT_JPEG_QUALITY: u32 = 95;

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy)]
pub struct RustBackend {
    jpeg_quality: Quality,
}

impl RustBackend {
    pub fn new() -> Self {
        Self {
            jpeg_quality: Quality::new(DEFAULT_JPEG_QUALITY),
        }
    }

    /// Quality for JPEG output written by crop/resize/rotate.
    pub fn with_jpeg_quality(jpeg_quality: Quality) -> Self {
        Self { jpeg_quality }
    }

    /// Save with the encoder implied by the output extension.
    pub fn save(&self, img: &DynamicImage, path: &Path) -> Result<(), BackendError> {
        match OutputFormat::from_path(path)? {
            OutputFormat::Png => save_png(img, path, PngCompression::default()),
            OutputFormat::Jpeg => save_jpeg(img, path, self.jpeg_quality),
            OutputFormat::Bmp => save_bmp(img, path),
        }
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
pub fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| BackendError::decode(path, e))
}

fn create_writer(path: &Path) -> Result<BufWriter<std::fs::File>, BackendError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(std::fs::File::create(path)?))
}

/// Map a 0-9 compression level onto the encoder's presets.
fn png_compression_type(level: PngCompression) -> CompressionType {
    match level.value() {
        0..=2 => CompressionType::Fast,
        3..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

fn save_png(img: &DynamicImage, path: &Path, level: PngCompression) -> Result<(), BackendError> {
    let writer = create_writer(path)?;
    let encoder =
        PngEncoder::new_with_quality(writer, png_compression_type(level), PngFilter::Adaptive);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::encode(path, e))
}

/// JPEG has no alpha channel; transparent pixels are flattened to their
/// color values.
fn save_jpeg(img: &DynamicImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
    let rgb = img.to_rgb8();
    let writer = create_writer(path)?;
    JpegEncoder::new_with_quality(writer, quality.value() as u8)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| BackendError::encode(path, e))
}

fn save_bmp(img: &DynamicImage, path: &Path) -> Result<(), BackendError> {
    let mut writer = create_writer(path)?;
    img.write_to(&mut writer, image::ImageFormat::Bmp)
        .map_err(|e| BackendError::encode(path, e))
}

/// Resize the watermark and fade its alpha channel.
pub fn prepare_watermark(mark: &RgbaImage, params: &WatermarkParams) -> RgbaImage {
    let (w, h) = scaled_watermark_size(mark.dimensions(), params.scale);
    let mut resized = if (w, h) == mark.dimensions() {
        mark.clone()
    } else {
        image::imageops::resize(mark, w, h, FilterType::Lanczos3)
    };
    for px in resized.pixels_mut() {
        px.0[3] = scale_alpha(px.0[3], params.opacity);
    }
    resized
}

/// Composite a prepared watermark onto `base` at its configured corner.
pub fn apply_watermark(base: &mut RgbaImage, prepared: &RgbaImage, params: &WatermarkParams) {
    let (x, y) = watermark_origin(params.position, base.dimensions(), prepared.dimensions());
    image::imageops::overlay(base, prepared, x, y);
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) =
            image::image_dimensions(path).map_err(|e| BackendError::decode(path, e))?;
        Ok(Dimensions { width, height })
    }

    #[instrument(skip_all, fields(source = %params.source.display(), position = %params.position))]
    fn watermark(
        &self,
        watermark: &RgbaImage,
        params: &WatermarkParams,
    ) -> Result<Dimensions, BackendError> {
        let mut base = load_image(&params.source)?.into_rgba8();
        let prepared = prepare_watermark(watermark, params);
        apply_watermark(&mut base, &prepared, params);
        debug!(
            width = base.width(),
            height = base.height(),
            mark_width = prepared.width(),
            mark_height = prepared.height(),
            "watermark applied"
        );
        let dims = Dimensions::from(base.dimensions());
        save_png(
            &DynamicImage::ImageRgba8(base),
            &params.output,
            PngCompression::default(),
        )?;
        Ok(dims)
    }

    #[instrument(skip_all, fields(source = %params.source.display()))]
    fn compress(&self, params: &CompressParams) -> Result<Dimensions, BackendError> {
        let img = load_image(&params.source)?;
        let dims = Dimensions::from((img.width(), img.height()));
        match OutputFormat::from_path(&params.output)? {
            OutputFormat::Jpeg => save_jpeg(&img, &params.output, params.quality)?,
            OutputFormat::Png => save_png(&img, &params.output, params.png_compression)?,
            OutputFormat::Bmp => {
                return Err(BackendError::UnsupportedFormat(
                    "bmp cannot be compressed; use .jpg or .png".into(),
                ));
            }
        }
        Ok(dims)
    }

    #[instrument(skip_all, fields(source = %params.source.display(), region = %params.region))]
    fn crop(&self, params: &CropParams) -> Result<Dimensions, BackendError> {
        let img = load_image(&params.source)?;
        let region = params
            .region
            .clamp_to(img.width(), img.height())
            .ok_or_else(|| {
                BackendError::InvalidRegion(format!(
                    "{} lies outside the {}x{} image",
                    params.region,
                    img.width(),
                    img.height()
                ))
            })?;
        let cropped = img.crop_imm(
            region.x as u32,
            region.y as u32,
            region.width,
            region.height,
        );
        self.save(&cropped, &params.output)?;
        Ok(Dimensions::from((cropped.width(), cropped.height())))
    }

    #[instrument(skip_all, fields(source = %params.source.display(), width = params.width, height = params.height))]
    fn resize(&self, params: &ResizeParams) -> Result<Dimensions, BackendError> {
        if params.width == 0 || params.height == 0 {
            return Err(BackendError::InvalidRegion(format!(
                "target size {}x{} is empty",
                params.width, params.height
            )));
        }
        let img = load_image(&params.source)?;
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        self.save(&resized, &params.output)?;
        Ok(Dimensions::from((resized.width(), resized.height())))
    }

    #[instrument(skip_all, fields(source = %params.source.display(), degrees = params.rotation.degrees()))]
    fn rotate(&self, params: &RotateParams) -> Result<Dimensions, BackendError> {
        let img = load_image(&params.source)?;
        let rotated = match params.rotation {
            Rotation::Cw90 => img.rotate90(),
            Rotation::Cw180 => img.rotate180(),
            Rotation::Cw270 => img.rotate270(),
        };
        self.save(&rotated, &params.output)?;
        Ok(Dimensions::from((rotated.width(), rotated.height())))
    }
}
