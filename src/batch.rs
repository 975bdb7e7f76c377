//! Sequential batch encoding.
//!
//! A run visits every queued item in order, renders it at full resolution
//! into its own target box (same geometry as the preview), and encodes it in
//! the batch-wide output format. Items never run concurrently: progress is
//! reported after each one, and a failure is recorded as
//! [`EncodeOutcome::Failed`] without stopping the run.
//!
//! ```text
//! Idle ──process──▶ Running ──last item / cancel──▶ Completed
//! ```
//!
//! Progress goes out as [`BatchEvent`]s over an optional channel, the same
//! way the CLI's printer thread consumes them.

use crate::imaging::{BackendError, EncodeParams, ImageBackend, OutputFormat, render_fit};
use crate::queue::{BatchQueue, ImageItem};
use image::DynamicImage;
use image::imageops::FilterType;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use tracing::{debug, info, warn};

/// Lifecycle of the batch processor.
///
/// A run borrows the queue for its whole duration, so `Running` is only
/// seen by whoever consumes its [`BatchEvent`]s; see [`BatchEvent::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    #[default]
    Idle,
    Running,
    Completed,
}

/// Result of encoding one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeOutcome {
    Encoded(Vec<u8>),
    Failed(String),
}

impl EncodeOutcome {
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            EncodeOutcome::Encoded(bytes) => Some(bytes),
            EncodeOutcome::Failed(_) => None,
        }
    }
}

/// One item's result, in queue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub display_name: String,
    pub outcome: EncodeOutcome,
}

/// Everything a run produced. A new run replaces the previous results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResults {
    pub format: OutputFormat,
    pub entries: Vec<BatchEntry>,
    /// The run stopped early; `entries` covers only the visited items.
    pub cancelled: bool,
}

impl BatchResults {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn encoded_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome.bytes().is_some())
            .count()
    }

    /// Names and reasons of the items that failed to encode.
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .filter_map(|e| match &e.outcome {
                EncodeOutcome::Failed(reason) => Some((e.display_name.as_str(), reason.as_str())),
                EncodeOutcome::Encoded(_) => None,
            })
            .collect()
    }
}

/// Progress reported while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Started {
        total: usize,
        format: OutputFormat,
    },
    ItemFinished {
        completed: usize,
        total: usize,
        name: String,
        /// Encoded size, or the failure reason.
        result: Result<usize, String>,
    },
    Cancelled {
        completed: usize,
        total: usize,
    },
    Finished {
        encoded: usize,
        failed: usize,
    },
}

impl BatchEvent {
    /// The state of the run once this event has been sent.
    pub fn state(&self) -> BatchState {
        match self {
            BatchEvent::Finished { .. } => BatchState::Completed,
            _ => BatchState::Running,
        }
    }
}

/// A single encoded file ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Render `item` at full resolution into its target box and encode it.
pub fn encode_item(
    backend: &impl ImageBackend,
    item: &ImageItem,
    format: OutputFormat,
) -> Result<Vec<u8>, BackendError> {
    let canvas = render_full(item);
    backend.encode(
        &canvas,
        &EncodeParams {
            format,
            quality: item.quality(),
        },
    )
}

/// The full-resolution composition of `item`, before encoding.
pub(crate) fn render_full(item: &ImageItem) -> DynamicImage {
    let region = item.source_region();
    DynamicImage::ImageRgba8(render_fit(
        &region,
        item.target(),
        item.fit_mode(),
        item.focus(),
        FilterType::Lanczos3,
    ))
}

/// Encode every item of `queue` in order.
///
/// `cancel` is checked before each item. The queue is borrowed for the
/// whole run, so it cannot be edited until the run returns.
pub fn process_queue(
    backend: &impl ImageBackend,
    queue: &BatchQueue,
    format: OutputFormat,
    cancel: Option<&AtomicBool>,
    events: Option<Sender<BatchEvent>>,
) -> BatchResults {
    let total = queue.len();
    let emit = |event: BatchEvent| {
        if let Some(tx) = &events {
            tx.send(event).ok();
        }
    };

    info!(total, %format, "batch started");
    emit(BatchEvent::Started { total, format });

    let mut entries = Vec::with_capacity(total);
    let mut cancelled = false;

    for item in queue.items() {
        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            cancelled = true;
            info!(completed = entries.len(), total, "batch cancelled");
            emit(BatchEvent::Cancelled {
                completed: entries.len(),
                total,
            });
            break;
        }

        let outcome = match encode_item(backend, item, format) {
            Ok(bytes) => {
                debug!(name = item.display_name(), bytes = bytes.len(), "encoded");
                EncodeOutcome::Encoded(bytes)
            }
            Err(e) => {
                warn!(name = item.display_name(), error = %e, "encode failed");
                EncodeOutcome::Failed(e.to_string())
            }
        };

        entries.push(BatchEntry {
            display_name: item.display_name().to_string(),
            outcome,
        });

        let last = &entries[entries.len() - 1];
        emit(BatchEvent::ItemFinished {
            completed: entries.len(),
            total,
            name: last.display_name.clone(),
            result: match &last.outcome {
                EncodeOutcome::Encoded(bytes) => Ok(bytes.len()),
                EncodeOutcome::Failed(reason) => Err(reason.clone()),
            },
        });
    }

    let results = BatchResults {
        format,
        entries,
        cancelled,
    };
    emit(BatchEvent::Finished {
        encoded: results.encoded_count(),
        failed: results.failures().len(),
    });
    results
}
