//! Shared test utilities: synthetic images written to temp directories.
//!
//! Tests never depend on checked-in binary fixtures; every image is generated
//! on the fly so expected pixel values are known exactly.

use image::{ImageEncoder, Rgba, RgbImage, RgbaImage};
use std::path::Path;

/// Write a JPEG with a smooth gradient (compresses differently per quality).
pub fn create_gradient_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a single-color PNG.
pub fn create_solid_png(path: &Path, width: u32, height: u32, color: [u8; 4]) {
    RgbaImage::from_pixel(width, height, Rgba(color))
        .save(path)
        .unwrap();
}

/// In-memory single-color watermark.
pub fn solid_watermark(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(color))
}

/// Populate `dir` with `names`, each a small solid PNG or gradient JPEG
/// depending on its extension. Other extensions get a text file.
pub fn populate_folder(dir: &Path, names: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    for name in names {
        let path = dir.join(name);
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "png" => create_solid_png(&path, 64, 48, [40, 80, 120, 255]),
            "jpg" | "jpeg" => create_gradient_jpeg(&path, 64, 48),
            _ => std::fs::write(&path, b"not an image").unwrap(),
        }
    }
}
