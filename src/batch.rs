//! Batch watermarking.
//!
//! Applies one watermark to every image in a folder. The watermark is decoded
//! once; each input is composited and written as `<output>/<stem>.png`.
//!
//! ## Progress
//!
//! Progress is reported as [`BatchEvent`]s on an optional
//! `std::sync::mpsc::Sender`, one [`BatchEvent::ImageDone`] per file with a
//! truncated percentage, so a caller can drive a progress bar while the
//! batch runs on a worker thread ([`spawn_watermark`]).
//!
//! ## Failure
//!
//! Everything that can be checked up front is checked before any image is
//! touched: the input folder, the watermark, and that no two inputs map to
//! the same output (`a.png` and `a.jpg` would both become `a.png`). After
//! that the first failing image aborts the batch. Files already written
//! stay on disk; there is no rollback and no retry.
//!
//! ## Input selection
//!
//! ```text
//! input/
//! ├── a.jpg          ✓
//! ├── b.PNG          ✓  (extension match is case-insensitive)
//! ├── notes.txt      ✗
//! └── nested/
//!     └── c.jpeg     ✓ only with `recursive`
//! ```

use crate::imaging::{
    BackendError, ImageBackend, Opacity, Position, RustBackend, WatermarkParams, WatermarkScale,
    load_image, progress_percent,
};
use image::RgbaImage;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// Extensions picked up from the input folder.
const WATERMARK_INPUT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Input folder not found: {0}")]
    InputNotFound(PathBuf),
    #[error("Watermark file not found: {0}")]
    WatermarkNotFound(PathBuf),
    #[error("Failed to list {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("Failed to load watermark: {0}")]
    Watermark(#[source] BackendError),
    #[error("Failed on {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("{first} and {second} would both be written to {output}")]
    OutputClash {
        first: PathBuf,
        second: PathBuf,
        output: PathBuf,
    },
    #[error("Batch worker panicked")]
    WorkerPanicked,
}

/// Everything needed to run one watermark batch.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkJob {
    pub input_dir: PathBuf,
    pub watermark: PathBuf,
    pub output_dir: PathBuf,
    pub position: Position,
    pub opacity: Opacity,
    pub scale: WatermarkScale,
    pub recursive: bool,
}

/// Progress notifications from a running batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    Started {
        total: usize,
    },
    ImageDone {
        /// 0-based position in the batch.
        index: usize,
        total: usize,
        percent: u8,
        source: PathBuf,
        output: PathBuf,
    },
    Completed {
        processed: usize,
    },
}

/// Summary of a finished batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub outputs: Vec<PathBuf>,
}

fn has_watermark_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            WATERMARK_INPUT_EXTENSIONS
                .iter()
                .any(|ok| e.eq_ignore_ascii_case(ok))
        })
}

/// List the images a batch would process, sorted by path.
pub fn collect_inputs(input_dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, BatchError> {
    if !input_dir.is_dir() {
        return Err(BatchError::InputNotFound(input_dir.to_path_buf()));
    }
    let walker = WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| BatchError::Walk {
            path: input_dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && has_watermark_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Output path for one input: same stem, always `.png`.
///
/// With a recursive walk the relative directory is preserved so that
/// `a/x.jpg` and `b/x.jpg` do not collide. Inputs in one folder that share
/// a stem do collide; [`prepare_batch`] refuses those.
pub fn output_path_for(input_dir: &Path, output_dir: &Path, source: &Path) -> PathBuf {
    let relative = source.strip_prefix(input_dir).unwrap_or(source);
    let parent = relative.parent().unwrap_or(Path::new(""));
    let stem = relative
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    let mut name = stem;
    name.push(".png");
    output_dir.join(parent).join(name)
}

fn send(progress: Option<&Sender<BatchEvent>>, event: BatchEvent) {
    if let Some(tx) = progress {
        // The receiver may have hung up; the batch still runs to completion.
        if tx.send(event).is_err() {
            debug!("progress receiver dropped");
        }
    }
}

/// A validated batch, ready to run: inputs listed, outputs planned,
/// watermark decoded and the output folder created.
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    job: WatermarkJob,
    watermark: RgbaImage,
    plan: Vec<(PathBuf, PathBuf)>,
}

impl PreparedBatch {
    /// `(source, output)` pairs in processing order.
    pub fn plan(&self) -> &[(PathBuf, PathBuf)] {
        &self.plan
    }
}

/// Check a job and do all the work that can fail before the first image.
///
/// Errors here mean nothing was written except, possibly, the output
/// folder itself.
pub fn prepare_batch(job: &WatermarkJob) -> Result<PreparedBatch, BatchError> {
    if !job.watermark.is_file() {
        return Err(BatchError::WatermarkNotFound(job.watermark.clone()));
    }
    let inputs = collect_inputs(&job.input_dir, job.recursive)?;

    let mut planned: HashMap<PathBuf, PathBuf> = HashMap::with_capacity(inputs.len());
    let mut plan = Vec::with_capacity(inputs.len());
    for source in inputs {
        let output = output_path_for(&job.input_dir, &job.output_dir, &source);
        if let Some(first) = planned.insert(output.clone(), source.clone()) {
            return Err(BatchError::OutputClash {
                first,
                second: source,
                output,
            });
        }
        plan.push((source, output));
    }

    let watermark = load_image(&job.watermark)
        .map_err(BatchError::Watermark)?
        .into_rgba8();
    std::fs::create_dir_all(&job.output_dir)?;

    Ok(PreparedBatch {
        job: job.clone(),
        watermark,
        plan,
    })
}

/// Run a watermark batch on the current thread with the default backend.
pub fn watermark_folder(
    job: &WatermarkJob,
    progress: Option<Sender<BatchEvent>>,
) -> Result<BatchSummary, BatchError> {
    watermark_folder_with_backend(&RustBackend::new(), job, progress)
}

/// Run a watermark batch using a specific backend (allows testing with mock).
pub fn watermark_folder_with_backend(
    backend: &impl ImageBackend,
    job: &WatermarkJob,
    progress: Option<Sender<BatchEvent>>,
) -> Result<BatchSummary, BatchError> {
    let prepared = prepare_batch(job)?;
    run_prepared(backend, &prepared, progress)
}

/// Watermark every planned image, reporting progress after each one.
pub fn run_prepared(
    backend: &impl ImageBackend,
    prepared: &PreparedBatch,
    progress: Option<Sender<BatchEvent>>,
) -> Result<BatchSummary, BatchError> {
    let job = &prepared.job;
    let total = prepared.plan.len();
    info!(
        total,
        input = %job.input_dir.display(),
        position = %job.position,
        opacity = job.opacity.value(),
        scale = job.scale.value(),
        "starting watermark batch"
    );
    if total == 0 {
        warn!(input = %job.input_dir.display(), "no images to watermark");
    }
    send(progress.as_ref(), BatchEvent::Started { total });

    let mut outputs = Vec::with_capacity(total);
    for (index, (source, output)) in prepared.plan.iter().enumerate() {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let params = WatermarkParams {
            source: source.clone(),
            output: output.clone(),
            position: job.position,
            opacity: job.opacity,
            scale: job.scale,
        };
        if let Err(e) = backend.watermark(&prepared.watermark, &params) {
            error!(path = %source.display(), error = %e, "watermark failed");
            return Err(BatchError::Image {
                path: source.clone(),
                source: e,
            });
        }
        send(
            progress.as_ref(),
            BatchEvent::ImageDone {
                index,
                total,
                percent: progress_percent(index + 1, total),
                source: source.clone(),
                output: output.clone(),
            },
        );
        outputs.push(output.clone());
    }

    send(
        progress.as_ref(),
        BatchEvent::Completed {
            processed: outputs.len(),
        },
    );
    Ok(BatchSummary {
        processed: outputs.len(),
        outputs,
    })
}

/// Handle to a batch running on its own thread.
pub struct BatchHandle {
    pub events: Receiver<BatchEvent>,
    handle: JoinHandle<Result<BatchSummary, BatchError>>,
}

impl BatchHandle {
    /// Wait for the worker and return its result.
    pub fn join(self) -> Result<BatchSummary, BatchError> {
        self.handle.join().map_err(|_| BatchError::WorkerPanicked)?
    }
}

/// Run a watermark batch on one dedicated worker thread.
///
/// The job is validated on the calling thread first, so a missing folder,
/// an unreadable watermark or clashing outputs are returned here and no
/// worker is started. Events arrive on [`BatchHandle::events`]; the channel
/// closes when the worker finishes, successfully or not. There is no
/// cancellation.
pub fn spawn_watermark(job: WatermarkJob) -> Result<BatchHandle, BatchError> {
    spawn_watermark_with_backend(RustBackend::new(), job)
}

/// [`spawn_watermark`] with an explicit backend.
pub fn spawn_watermark_with_backend<B>(backend: B, job: WatermarkJob) -> Result<BatchHandle, BatchError>
where
    B: ImageBackend + Send + 'static,
{
    let prepared = prepare_batch(&job)?;
    let (tx, rx) = channel();
    let handle = std::thread::Builder::new()
        .name("watermark-batch".into())
        .spawn(move || run_prepared(&backend, &prepared, Some(tx)))?;
    Ok(BatchHandle { events: rx, handle })
}
