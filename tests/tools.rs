//! End-to-end checks of the public tool API on real files.
//!
//! Images are generated on the fly into a temp dir; nothing is read from
//! the repository.

use image::{ImageBuffer, Rgb, Rgba, RgbaImage};
use imgtool::batch::{self, BatchError, BatchEvent, WatermarkJob};
use imgtool::config;
use imgtool::imaging::{
    self, Opacity, PngCompression, Position, Quality, ResizeScale, ResizeTarget, Rotation,
    RustBackend, WatermarkScale,
};
use imgtool::screenshot::{self, FileGrabber};
use imgtool::selection::{Point, Rect, RegionSelector};
use std::path::Path;
use tempfile::TempDir;

fn write_gradient_jpeg(path: &Path, width: u32, height: u32) {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
    });
    img.save(path).unwrap();
}

fn write_solid_png(path: &Path, width: u32, height: u32, color: [u8; 4]) {
    RgbaImage::from_pixel(width, height, Rgba(color))
        .save(path)
        .unwrap();
}

#[test]
fn watermark_folder_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("photos");
    std::fs::create_dir(&input).unwrap();
    write_gradient_jpeg(&input.join("a.jpg"), 120, 80);
    write_solid_png(&input.join("b.PNG"), 60, 40, [0, 0, 0, 255]);
    std::fs::write(input.join("notes.txt"), "skip me").unwrap();

    let mark = tmp.path().join("mark.png");
    write_solid_png(&mark, 20, 10, [255, 255, 255, 255]);

    let job = WatermarkJob {
        input_dir: input,
        watermark: mark,
        output_dir: tmp.path().join("out"),
        position: Position::TopLeft,
        opacity: Opacity::new(100),
        scale: WatermarkScale::new(100),
        recursive: false,
    };

    let handle = batch::spawn_watermark(job).unwrap();
    let events: Vec<BatchEvent> = handle.events.iter().collect();
    let summary = handle.join().unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(events.first(), Some(&BatchEvent::Started { total: 2 }));
    assert_eq!(events.last(), Some(&BatchEvent::Completed { processed: 2 }));
    let percents: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            BatchEvent::ImageDone { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect();
    assert_eq!(percents, vec![50, 100]);

    let b = image::open(tmp.path().join("out/b.png")).unwrap().to_rgba8();
    assert_eq!(b.dimensions(), (60, 40));
    assert_eq!(b.get_pixel(0, 0).0, [255, 255, 255, 255]);
    assert_eq!(b.get_pixel(30, 30).0, [0, 0, 0, 255]);
}

#[test]
fn empty_folder_completes_without_output() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("empty");
    std::fs::create_dir(&input).unwrap();
    let mark = tmp.path().join("mark.png");
    write_solid_png(&mark, 4, 4, [255, 0, 0, 255]);

    let summary = batch::watermark_folder(
        &WatermarkJob {
            input_dir: input,
            watermark: mark,
            output_dir: tmp.path().join("out"),
            position: Position::BottomRight,
            opacity: Opacity::new(50),
            scale: WatermarkScale::new(100),
            recursive: false,
        },
        None,
    )
    .unwrap();
    assert_eq!(summary.processed, 0);
}

#[test]
fn inputs_sharing_a_stem_are_refused_up_front() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("photos");
    std::fs::create_dir(&input).unwrap();
    write_gradient_jpeg(&input.join("a.jpg"), 32, 32);
    write_solid_png(&input.join("a.png"), 32, 32, [0, 0, 0, 255]);
    let mark = tmp.path().join("mark.png");
    write_solid_png(&mark, 4, 4, [255, 0, 0, 255]);
    let output_dir = tmp.path().join("out");

    let result = batch::spawn_watermark(WatermarkJob {
        input_dir: input,
        watermark: mark,
        output_dir: output_dir.clone(),
        position: Position::BottomRight,
        opacity: Opacity::new(100),
        scale: WatermarkScale::new(100),
        recursive: false,
    });
    assert!(matches!(result, Err(BatchError::OutputClash { .. })));
    assert!(!output_dir.exists());
}

#[test]
fn spawn_with_missing_input_fails_immediately() {
    let tmp = TempDir::new().unwrap();
    let mark = tmp.path().join("mark.png");
    write_solid_png(&mark, 4, 4, [255, 0, 0, 255]);

    let result = batch::spawn_watermark(WatermarkJob {
        input_dir: tmp.path().join("nope"),
        watermark: mark,
        output_dir: tmp.path().join("out"),
        position: Position::BottomRight,
        opacity: Opacity::new(100),
        scale: WatermarkScale::new(100),
        recursive: false,
    });
    assert!(matches!(result, Err(BatchError::InputNotFound(_))));
}

#[test]
fn compress_to_lower_quality_shrinks_jpeg() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("photo.jpg");
    write_gradient_jpeg(&src, 400, 300);

    let backend = RustBackend::new();
    let small = tmp.path().join("small.jpg");
    let report = imaging::compress_image(
        &backend,
        &src,
        &small,
        Quality::new(10),
        PngCompression::default(),
    )
    .unwrap();

    assert_eq!((report.result.width, report.result.height), (400, 300));
    assert!(report.output_bytes > 0);
    assert!(report.output_bytes < report.input_bytes);
}

#[test]
fn crop_resize_rotate_chain() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src.png");
    write_solid_png(&src, 200, 100, [10, 20, 30, 255]);
    let backend = RustBackend::new();

    let cropped = tmp.path().join("cropped.png");
    imaging::crop_image(&backend, &src, &cropped, Rect::new(50, 0, 100, 100)).unwrap();
    assert_eq!(image::image_dimensions(&cropped).unwrap(), (100, 100));

    let resized = tmp.path().join("resized.jpg");
    imaging::resize_image(
        &backend,
        &cropped,
        &resized,
        ResizeTarget::Scale(ResizeScale::new(50)),
    )
    .unwrap();
    assert_eq!(image::image_dimensions(&resized).unwrap(), (50, 50));

    let rotated = tmp.path().join("rotated.bmp");
    let report = imaging::rotate_image(&backend, &src, &rotated, Rotation::Cw90).unwrap();
    assert_eq!((report.result.width, report.result.height), (100, 200));
    assert_eq!(image::image_dimensions(&rotated).unwrap(), (100, 200));
}

#[test]
fn drag_selection_on_preview_crops_full_image() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("big.png");
    write_solid_png(&src, 800, 600, [1, 2, 3, 255]);

    let mut selector = RegionSelector::new();
    selector.press(Point::new(300, 200));
    selector.drag(Point::new(250, 150));
    let selection = selector.release(Point::new(200, 150)).unwrap();
    assert_eq!(selection, Rect::new(200, 150, 100, 50));

    let out = tmp.path().join("sel.png");
    imaging::crop_view_selection(&RustBackend::new(), &src, &out, selection, (400, 300)).unwrap();
    assert_eq!(image::image_dimensions(&out).unwrap(), (200, 100));
}

#[test]
fn screenshot_region_from_file_on_hidpi() {
    let tmp = TempDir::new().unwrap();
    let frame = tmp.path().join("frame.png");
    write_solid_png(&frame, 400, 200, [9, 9, 9, 255]);

    let grabber = FileGrabber::new(&frame, 2.0);
    let shot = screenshot::capture_region(&grabber, Rect::new(10, 10, 50, 25)).unwrap();
    assert_eq!(shot.dimensions(), (100, 50));

    let out = tmp.path().join("shot.jpg");
    screenshot::save_capture(&shot, &out, Quality::new(80)).unwrap();
    assert_eq!(image::image_dimensions(&out).unwrap(), (100, 50));
}

#[test]
fn local_config_feeds_tool_defaults() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join(config::DEFAULT_CONFIG_FILE),
        "[watermark]\nposition = \"top-right\"\nopacity = 150\n",
    )
    .unwrap();
    let cfg = config::load_config(None, tmp.path()).unwrap();
    assert_eq!(cfg.watermark.position, Position::TopRight);
    assert_eq!(cfg.watermark.opacity.value(), 100);
}
