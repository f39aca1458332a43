//! CLI output formatting.
//!
//! Each tool has a `format_*` function returning `Vec<String>` for
//! testability and the binary prints the lines. Format functions are pure:
//! no I/O, no side effects.
//!
//! ```text
//! [ 33%] 001 beach.jpg → out/beach.png
//! [ 66%] 002 city.png → out/city.png
//! [100%] 003 dusk.jpeg → out/dusk.png
//! Watermarked 3 images
//!
//! compress photo.jpg → small.jpg
//!     2000x1500, 1.8 MiB → 412.0 KiB (-77%)
//! ```

use crate::batch::{BatchEvent, BatchSummary};
use crate::imaging::OperationReport;
use std::path::Path;

/// Human-readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Format a single batch progress event.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total } => {
            vec![format!("Watermarking {total} images")]
        }
        BatchEvent::ImageDone {
            index,
            percent,
            source,
            output,
            ..
        } => vec![format!(
            "[{:>3}%] {:0>3} {} \u{2192} {}",
            percent,
            index + 1,
            file_name(source),
            output.display()
        )],
        BatchEvent::Completed { processed } => match processed {
            0 => vec!["No images found".to_string()],
            1 => vec!["Watermarked 1 image".to_string()],
            n => vec![format!("Watermarked {n} images")],
        },
    }
}

/// One-line-per-output summary after a batch.
pub fn format_batch_summary(summary: &BatchSummary) -> Vec<String> {
    summary
        .outputs
        .iter()
        .map(|p| format!("    {}", p.display()))
        .collect()
}

/// Format the result of a single-image tool.
pub fn format_report(report: &OperationReport) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} \u{2192} {}",
        report.tool,
        file_name(&report.source),
        report.output.display()
    )];

    let dims = if report.input == report.result {
        format!("{}x{}", report.result.width, report.result.height)
    } else {
        format!(
            "{}x{} \u{2192} {}x{}",
            report.input.width, report.input.height, report.result.width, report.result.height
        )
    };

    let sizes = if report.input_bytes > 0 {
        let change =
            (report.output_bytes as f64 - report.input_bytes as f64) / report.input_bytes as f64;
        format!(
            "{} \u{2192} {} ({:+.0}%)",
            format_bytes(report.input_bytes),
            format_bytes(report.output_bytes),
            change * 100.0
        )
    } else {
        format_bytes(report.output_bytes)
    };
    lines.push(format!("    {dims}, {sizes}"));
    lines
}

/// Format a saved screenshot.
pub fn format_capture(width: u32, height: u32, destination: &str) -> Vec<String> {
    vec![format!("screenshot {width}x{height} \u{2192} {destination}")]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use std::path::PathBuf;

    #[test]
    fn bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 / 2), "1.5 MiB");
    }

    #[test]
    fn batch_event_lines() {
        let line = format_batch_event(&BatchEvent::ImageDone {
            index: 0,
            total: 3,
            percent: 33,
            source: PathBuf::from("/in/beach.jpg"),
            output: PathBuf::from("out/beach.png"),
        });
        assert_eq!(line, vec!["[ 33%] 001 beach.jpg \u{2192} out/beach.png"]);

        assert_eq!(
            format_batch_event(&BatchEvent::Completed { processed: 0 }),
            vec!["No images found"]
        );
        assert_eq!(
            format_batch_event(&BatchEvent::Completed { processed: 1 }),
            vec!["Watermarked 1 image"]
        );
    }

    #[test]
    fn batch_summary_lists_outputs() {
        let summary = BatchSummary {
            processed: 2,
            outputs: vec![PathBuf::from("out/a.png"), PathBuf::from("out/sub/b.png")],
        };
        assert_eq!(
            format_batch_summary(&summary),
            vec!["    out/a.png", "    out/sub/b.png"]
        );
    }

    #[test]
    fn report_lines_show_size_change() {
        let report = OperationReport {
            tool: "compress",
            source: PathBuf::from("/p/photo.jpg"),
            output: PathBuf::from("small.jpg"),
            input: Dimensions {
                width: 2000,
                height: 1500,
            },
            result: Dimensions {
                width: 2000,
                height: 1500,
            },
            input_bytes: 1000,
            output_bytes: 250,
        };
        let lines = format_report(&report);
        assert_eq!(lines[0], "compress photo.jpg \u{2192} small.jpg");
        assert_eq!(lines[1], "    2000x1500, 1000 B \u{2192} 250 B (-75%)");
    }

    #[test]
    fn report_lines_show_dimension_change() {
        let report = OperationReport {
            tool: "rotate",
            source: PathBuf::from("a.png"),
            output: PathBuf::from("b.png"),
            input: Dimensions {
                width: 4,
                height: 2,
            },
            result: Dimensions {
                width: 2,
                height: 4,
            },
            input_bytes: 0,
            output_bytes: 10,
        };
        assert_eq!(format_report(&report)[1], "    4x2 \u{2192} 2x4, 10 B");
    }
}
