use clap::{ArgAction, Parser, Subcommand};
use imgtool::batch::{self, WatermarkJob};
use imgtool::config::{self, ToolConfig};
use imgtool::imaging::{
    self, OperationReport, Opacity, PngCompression, Position, Quality, ResizeScale, ResizeTarget,
    Rotation, RustBackend, WatermarkScale,
};
use imgtool::output;
use imgtool::screenshot::{self, CommandGrabber, FileGrabber};
use imgtool::selection::{Rect, parse_size};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imgtool")]
#[command(about = "Small image utilities: watermark, compress, crop, resize, rotate, screenshot")]
#[command(long_about = "\
Small image utilities: watermark, compress, crop, resize, rotate, screenshot

Every tool reads PNG/JPEG/BMP and picks the output encoder from the output
file extension.

Defaults come from imgtool.toml in the working directory (or --config FILE);
flags override them. Run 'imgtool gen-config' for a documented template.

Logging goes to stderr; set RUST_LOG or pass -v / -vv for more detail.")]
#[command(version)]
struct Cli {
    /// Preferences file (default: ./imgtool.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Paste a watermark into every image of a folder
    Watermark {
        /// Folder with .png/.jpg/.jpeg images
        #[arg(long)]
        input: PathBuf,
        /// Watermark image (transparency is respected)
        #[arg(long)]
        watermark: PathBuf,
        /// Folder for the watermarked PNGs (created if missing)
        #[arg(long)]
        output: PathBuf,
        /// top-left, top-right, bottom-left or bottom-right
        #[arg(long)]
        position: Option<Position>,
        /// Opacity in percent (0-100)
        #[arg(long)]
        opacity: Option<u32>,
        /// Watermark scale in percent (10-300)
        #[arg(long)]
        scale: Option<u32>,
        /// Include images in subfolders
        #[arg(long)]
        recursive: bool,
    },
    /// Re-encode an image as JPEG (quality) or PNG (compression level)
    Compress {
        input: PathBuf,
        /// Output path ending in .jpg, .jpeg or .png
        output: PathBuf,
        /// JPEG quality (1-100)
        #[arg(long)]
        quality: Option<u32>,
        /// PNG compression level (0-9)
        #[arg(long)]
        png_compression: Option<u32>,
    },
    /// Cut a rectangle out of an image
    Crop {
        input: PathBuf,
        output: PathBuf,
        /// Rectangle as X,Y,W,H
        #[arg(long, allow_hyphen_values = true)]
        rect: Rect,
        /// Treat --rect as drawn on a preview of this size (WxH)
        #[arg(long, value_parser = parse_size_arg)]
        view: Option<(u32, u32)>,
    },
    /// Shrink an image, keeping its aspect ratio
    Resize {
        input: PathBuf,
        output: PathBuf,
        /// Scale in percent (10-100)
        #[arg(long, conflicts_with = "fit")]
        scale: Option<u32>,
        /// Fit inside a WxH box
        #[arg(long, value_parser = parse_size_arg)]
        fit: Option<(u32, u32)>,
    },
    /// Rotate an image clockwise
    Rotate {
        input: PathBuf,
        output: PathBuf,
        /// Multiple of 90; negative turns counter-clockwise
        #[arg(long, allow_hyphen_values = true, conflicts_with = "turns")]
        degrees: Option<i32>,
        /// Number of clockwise quarter turns
        #[arg(long)]
        turns: Option<u32>,
    },
    /// Capture the screen or a region of it
    Screenshot {
        /// Region in logical points as X,Y,W,H (default: whole screen)
        #[arg(long, allow_hyphen_values = true)]
        region: Option<Rect>,
        /// Use an existing image as the captured frame
        #[arg(long)]
        from: Option<PathBuf>,
        /// Device-pixel ratio of the captured screen
        #[arg(long)]
        dpr: Option<f64>,
        /// Save the capture to this file
        #[arg(long, required_unless_present = "clipboard")]
        save: Option<PathBuf>,
        /// Copy the capture to the clipboard
        #[arg(long, conflicts_with = "save")]
        clipboard: bool,
    },
    /// Print a stock imgtool.toml with all options documented
    GenConfig,
}

fn parse_size_arg(s: &str) -> Result<(u32, u32), String> {
    parse_size(s).map_err(|e| e.to_string())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if matches!(cli.command, Command::GenConfig) {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let cwd = std::env::current_dir()?;
    let cfg = config::load_config(cli.config.as_deref(), &cwd)?;
    let backend = RustBackend::with_jpeg_quality(cfg.output.jpeg_quality);

    match &cli.command {
        Command::Watermark {
            input,
            watermark,
            output,
            position,
            opacity,
            scale,
            recursive,
        } => {
            let job = WatermarkJob {
                input_dir: input.clone(),
                watermark: watermark.clone(),
                output_dir: output.clone(),
                position: position.unwrap_or(cfg.watermark.position),
                opacity: opacity.map(Opacity::new).unwrap_or(cfg.watermark.opacity),
                scale: scale.map(WatermarkScale::new).unwrap_or(cfg.watermark.scale),
                recursive: *recursive || cfg.watermark.recursive,
            };
            run_watermark(job, backend, cli.json)?;
        }
        Command::Compress {
            input,
            output,
            quality,
            png_compression,
        } => {
            let report = imaging::compress_image(
                &backend,
                input,
                output,
                quality.map(Quality::new).unwrap_or(cfg.compress.quality),
                png_compression
                    .map(PngCompression::new)
                    .unwrap_or(cfg.compress.png_compression),
            )?;
            print_report(&report, cli.json)?;
        }
        Command::Crop {
            input,
            output,
            rect,
            view,
        } => {
            let report = match view {
                Some(view) => imaging::crop_view_selection(&backend, input, output, *rect, *view)?,
                None => imaging::crop_image(&backend, input, output, *rect)?,
            };
            print_report(&report, cli.json)?;
        }
        Command::Resize {
            input,
            output,
            scale,
            fit,
        } => {
            let target = match (fit, scale) {
                (Some((width, height)), _) => ResizeTarget::Fit {
                    width: *width,
                    height: *height,
                },
                (None, Some(s)) => ResizeTarget::Scale(ResizeScale::new(*s)),
                (None, None) => ResizeTarget::Scale(cfg.resize.scale),
            };
            let report = imaging::resize_image(&backend, input, output, target)?;
            print_report(&report, cli.json)?;
        }
        Command::Rotate {
            input,
            output,
            degrees,
            turns,
        } => {
            let rotation = match (degrees, turns) {
                (Some(d), _) => Rotation::from_degrees(*d)?,
                (None, Some(t)) => Rotation::from_turns(*t),
                (None, None) => Some(Rotation::Cw90),
            };
            let rotation = rotation.ok_or("rotation is a full turn; nothing to do")?;
            let report = imaging::rotate_image(&backend, input, output, rotation)?;
            print_report(&report, cli.json)?;
        }
        Command::Screenshot {
            region,
            from,
            dpr,
            save,
            clipboard,
        } => {
            run_screenshot(&cfg, *region, from.clone(), *dpr, save.clone(), *clipboard, cli.json)?;
        }
        Command::GenConfig => unreachable!("handled above"),
    }

    Ok(())
}

/// Run the batch on its worker thread and print progress as it arrives.
fn run_watermark(
    job: WatermarkJob,
    backend: RustBackend,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let handle = batch::spawn_watermark_with_backend(backend, job)?;
    for event in handle.events.iter() {
        if json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            for line in output::format_batch_event(&event) {
                println!("{line}");
            }
        }
    }
    let summary = handle.join()?;
    if json {
        println!("{}", serde_json::to_string(&summary)?);
    } else if !summary.outputs.is_empty() {
        println!("Written:");
        for line in output::format_batch_summary(&summary) {
            println!("{line}");
        }
    }
    Ok(())
}

fn run_screenshot(
    cfg: &ToolConfig,
    region: Option<Rect>,
    from: Option<PathBuf>,
    dpr: Option<f64>,
    save: Option<PathBuf>,
    clipboard: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let dpr = dpr.unwrap_or(cfg.screenshot.device_pixel_ratio);
    if !dpr.is_finite() || dpr <= 0.0 {
        return Err(format!("device-pixel ratio must be positive, got {dpr}").into());
    }

    let frame = match from {
        Some(path) => capture(&FileGrabber::new(path, dpr), region)?,
        None => capture(
            &CommandGrabber::new(cfg.screenshot.command.clone(), dpr)?,
            region,
        )?,
    };

    let destination = match save {
        Some(path) if !clipboard => {
            screenshot::save_capture(&frame, &path, cfg.output.jpeg_quality)?;
            path.display().to_string()
        }
        _ => {
            screenshot::copy_to_clipboard(&frame)?;
            "clipboard".to_string()
        }
    };

    if json {
        println!(
            "{}",
            serde_json::json!({
                "tool": "screenshot",
                "width": frame.width(),
                "height": frame.height(),
                "destination": destination,
            })
        );
    } else {
        for line in output::format_capture(frame.width(), frame.height(), &destination) {
            println!("{line}");
        }
    }
    Ok(())
}

fn capture(
    grabber: &impl screenshot::ScreenGrabber,
    region: Option<Rect>,
) -> Result<image::RgbaImage, screenshot::ScreenshotError> {
    match region {
        Some(rect) => screenshot::capture_region(grabber, rect),
        None => screenshot::capture_full(grabber),
    }
}

fn print_report(report: &OperationReport, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        for line in output::format_report(report) {
            println!("{line}");
        }
    }
    Ok(())
}
