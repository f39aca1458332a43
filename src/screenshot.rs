//! Screen capture.
//!
//! Grabbing the screen is platform plumbing, so it sits behind the
//! [`ScreenGrabber`] trait:
//!
//! - [`CommandGrabber`] runs an external capture program that writes a PNG
//!   (`grim`, `scrot`, `screencapture -x`, ...). The `{output}` argument is
//!   replaced with a temporary file path.
//! - [`FileGrabber`] treats an existing image as the captured frame.
//!
//! A frame is always in physical pixels. Regions are given in logical
//! points and scaled by the grabber's device-pixel ratio before cropping.

use crate::imaging::{BackendError, Quality, RustBackend, load_image};
use crate::selection::{Rect, SelectionError};
use image::{DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Placeholder substituted with the capture file path.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

#[derive(Error, Debug)]
pub enum ScreenshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No capture command configured (set [screenshot].command or use --from)")]
    NoCommand,
    #[error("Capture command `{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
    #[error(transparent)]
    Image(#[from] BackendError),
    #[error(transparent)]
    Region(#[from] SelectionError),
    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

/// Source of full-screen frames.
pub trait ScreenGrabber {
    /// Capture the whole primary screen in physical pixels.
    fn grab(&self) -> Result<RgbaImage, ScreenshotError>;

    /// Physical pixels per logical point.
    fn device_pixel_ratio(&self) -> f64 {
        1.0
    }
}

/// Capture by running an external program.
#[derive(Debug, Clone)]
pub struct CommandGrabber {
    argv: Vec<String>,
    device_pixel_ratio: f64,
    scratch_dir: PathBuf,
}

impl CommandGrabber {
    pub fn new(argv: Vec<String>, device_pixel_ratio: f64) -> Result<Self, ScreenshotError> {
        if argv.is_empty() {
            return Err(ScreenshotError::NoCommand);
        }
        Ok(Self {
            argv,
            device_pixel_ratio,
            scratch_dir: std::env::temp_dir(),
        })
    }

    /// Directory for the temporary capture file.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    fn scratch_path(&self) -> PathBuf {
        self.scratch_dir
            .join(format!("imgtool-capture-{}.png", std::process::id()))
    }

    /// Argument vector with the placeholder replaced. If no argument holds
    /// the placeholder the path is appended.
    fn resolved_args(&self, output: &Path) -> Vec<String> {
        let out = output.to_string_lossy();
        let mut args: Vec<String> = self
            .argv
            .iter()
            .map(|a| a.replace(OUTPUT_PLACEHOLDER, &out))
            .collect();
        if !self.argv.iter().any(|a| a.contains(OUTPUT_PLACEHOLDER)) {
            args.push(out.into_owned());
        }
        args
    }
}

impl ScreenGrabber for CommandGrabber {
    #[instrument(skip(self), fields(program = %self.argv[0]))]
    fn grab(&self) -> Result<RgbaImage, ScreenshotError> {
        let path = self.scratch_path();
        let args = self.resolved_args(&path);
        debug!(?args, "running capture command");

        let out = Command::new(&args[0]).args(&args[1..]).output()?;
        if !out.status.success() {
            return Err(ScreenshotError::CommandFailed {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        let frame = load_image(&path);
        // Best effort: the scratch file is not needed once decoded.
        let _ = std::fs::remove_file(&path);
        Ok(frame?.into_rgba8())
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }
}

/// Use an already captured image as the frame.
#[derive(Debug, Clone)]
pub struct FileGrabber {
    path: PathBuf,
    device_pixel_ratio: f64,
}

impl FileGrabber {
    pub fn new(path: impl Into<PathBuf>, device_pixel_ratio: f64) -> Self {
        Self {
            path: path.into(),
            device_pixel_ratio,
        }
    }
}

impl ScreenGrabber for FileGrabber {
    fn grab(&self) -> Result<RgbaImage, ScreenshotError> {
        Ok(load_image(&self.path)?.into_rgba8())
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }
}

/// Capture the whole screen.
pub fn capture_full(grabber: &impl ScreenGrabber) -> Result<RgbaImage, ScreenshotError> {
    let frame = grabber.grab()?;
    info!(width = frame.width(), height = frame.height(), "captured screen");
    Ok(frame)
}

/// Capture the part of the screen under `logical` (in points).
pub fn capture_region(
    grabber: &impl ScreenGrabber,
    logical: Rect,
) -> Result<RgbaImage, ScreenshotError> {
    let frame = grabber.grab()?;
    crop_frame(&frame, logical, grabber.device_pixel_ratio())
}

/// Crop a captured frame to a logical selection.
pub fn crop_frame(
    frame: &RgbaImage,
    logical: Rect,
    device_pixel_ratio: f64,
) -> Result<RgbaImage, ScreenshotError> {
    let physical = logical
        .scale(device_pixel_ratio)
        .clamp_or_err(frame.width(), frame.height())?;
    debug!(%logical, %physical, device_pixel_ratio, "cropping frame");
    Ok(image::imageops::crop_imm(
        frame,
        physical.x as u32,
        physical.y as u32,
        physical.width,
        physical.height,
    )
    .to_image())
}

/// Write a capture to disk; the extension picks the encoder.
pub fn save_capture(
    frame: &RgbaImage,
    path: &Path,
    jpeg_quality: Quality,
) -> Result<(), ScreenshotError> {
    RustBackend::with_jpeg_quality(jpeg_quality)
        .save(&DynamicImage::ImageRgba8(frame.clone()), path)?;
    info!(path = %path.display(), "screenshot saved");
    Ok(())
}

/// Put a capture on the system clipboard.
#[cfg(feature = "clipboard")]
pub fn copy_to_clipboard(frame: &RgbaImage) -> Result<(), ScreenshotError> {
    let mut clip =
        arboard::Clipboard::new().map_err(|e| ScreenshotError::Clipboard(e.to_string()))?;
    let data = arboard::ImageData {
        width: frame.width() as usize,
        height: frame.height() as usize,
        bytes: std::borrow::Cow::Borrowed(frame.as_raw()),
    };
    clip.set_image(data)
        .map_err(|e| ScreenshotError::Clipboard(e.to_string()))?;
    info!("screenshot copied to clipboard");
    Ok(())
}

#[cfg(not(feature = "clipboard"))]
pub fn copy_to_clipboard(_frame: &RgbaImage) -> Result<(), ScreenshotError> {
    Err(ScreenshotError::Clipboard(
        "built without the `clipboard` feature".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// In-memory grabber with a marker pixel at physical (20, 10).
    struct StaticGrabber {
        dpr: f64,
    }

    impl ScreenGrabber for StaticGrabber {
        fn grab(&self) -> Result<RgbaImage, ScreenshotError> {
            let mut img = RgbaImage::from_pixel(200, 100, Rgba([0, 0, 0, 255]));
            img.put_pixel(20, 10, Rgba([255, 0, 0, 255]));
            Ok(img)
        }

        fn device_pixel_ratio(&self) -> f64 {
            self.dpr
        }
    }

    #[test]
    fn full_capture_returns_frame() {
        let frame = capture_full(&StaticGrabber { dpr: 1.0 }).unwrap();
        assert_eq!(frame.dimensions(), (200, 100));
    }

    #[test]
    fn region_capture_scales_by_dpr() {
        let grabber = StaticGrabber { dpr: 2.0 };
        let region = capture_region(&grabber, Rect::new(10, 5, 20, 10)).unwrap();
        assert_eq!(region.dimensions(), (40, 20));
        assert_eq!(region.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn region_capture_clamps_to_frame() {
        let grabber = StaticGrabber { dpr: 1.0 };
        let region = capture_region(&grabber, Rect::new(190, 90, 50, 50)).unwrap();
        assert_eq!(region.dimensions(), (10, 10));
    }

    #[test]
    fn region_outside_frame_errors() {
        let grabber = StaticGrabber { dpr: 1.0 };
        let result = capture_region(&grabber, Rect::new(300, 300, 5, 5));
        assert!(matches!(result, Err(ScreenshotError::Region(_))));
    }

    #[test]
    fn command_args_substitute_placeholder() {
        let g = CommandGrabber::new(vec!["grim".into(), "-t".into(), "png".into(), "{output}".into()], 1.0)
            .unwrap();
        let args = g.resolved_args(Path::new("/tmp/x.png"));
        assert_eq!(args, vec!["grim", "-t", "png", "/tmp/x.png"]);
    }

    #[test]
    fn command_args_append_when_no_placeholder() {
        let g = CommandGrabber::new(vec!["scrot".into()], 1.0).unwrap();
        let args = g.resolved_args(Path::new("/tmp/x.png"));
        assert_eq!(args, vec!["scrot", "/tmp/x.png"]);
    }

    #[test]
    fn empty_command_rejected() {
        assert!(matches!(
            CommandGrabber::new(Vec::new(), 1.0),
            Err(ScreenshotError::NoCommand)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_reports_stderr() {
        let tmp = tempfile::TempDir::new().unwrap();
        let g = CommandGrabber::new(vec!["false".into()], 1.0)
            .unwrap()
            .with_scratch_dir(tmp.path());
        assert!(matches!(
            g.grab(),
            Err(ScreenshotError::CommandFailed { .. })
        ));
    }

    #[test]
    fn file_grabber_and_save() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("frame.png");
        crate::test_helpers::create_solid_png(&src, 30, 20, [5, 6, 7, 255]);

        let grabber = FileGrabber::new(&src, 1.0);
        let frame = capture_region(&grabber, Rect::new(0, 0, 10, 10)).unwrap();
        let out = tmp.path().join("shot.bmp");
        save_capture(&frame, &out, Quality::new(90)).unwrap();
        assert_eq!(image::image_dimensions(&out).unwrap(), (10, 10));
    }
}
