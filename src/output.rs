//! CLI output formatting.
//!
//! Every entity leads with its 1-based queue position and display name,
//! with details on indented lines underneath:
//!
//! ## Queue
//!
//! ```text
//! Queue: 2 images, webp
//! 001 dawn  4032x3024 -> 800x600  cover  q90
//!     Source: 2.41 MB (large)
//!     Estimated: 61.2 KB
//!     Focus: 0.50, 0.30
//! 002 dusk  1200x800 -> 1200x800  contain  q90
//!     Source: 312.4 KB
//!     Crop: 0,0 600x400
//! ```
//!
//! ## Process
//!
//! ```text
//! Processing 2 images as webp
//! [1/2] dawn: 48.1 KB
//! [2/2] dusk: FAILED Encode failed: ...
//! Encoded 1, failed 1
//! ```
//!
//! ## Export
//!
//! ```text
//! dawn -> out/dawn.webp (48.1 KB)
//! Wrote 1 file to out (manifest.json)
//! Skipped 1 failed image:
//!     dusk: Encode failed: ...
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::batch::BatchEvent;
use crate::editor::Editor;
use crate::export::{ExportReport, MANIFEST_FILE};
use crate::imaging::OutputFormat;
use crate::layout::Layout;
use crate::optimize::QualityChoice;
use crate::queue::ImageItem;
use std::path::Path;

const KB: f64 = 1024.0;
const MB: f64 = 1024.0 * 1024.0;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// How heavy a file is, for flagging large sources and outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    Ok,
    /// Over 2 MB.
    Warning,
    /// Over 5 MB.
    Danger,
}

impl SizeClass {
    pub fn of(bytes: u64) -> Self {
        let mb = bytes as f64 / MB;
        if mb > 5.0 {
            SizeClass::Danger
        } else if mb > 2.0 {
            SizeClass::Warning
        } else {
            SizeClass::Ok
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            SizeClass::Ok => "",
            SizeClass::Warning => " (large)",
            SizeClass::Danger => " (very large)",
        }
    }
}

/// Human-readable size: MB with two decimals from 1 MB up, else KB with one.
///
/// ```text
/// 2_621_440 -> "2.50 MB"
/// 1_536     -> "1.5 KB"
/// ```
pub fn format_size(bytes: u64) -> String {
    let b = bytes as f64;
    if b >= MB {
        format!("{:.2} MB", b / MB)
    } else {
        format!("{:.1} KB", b / KB)
    }
}

/// [`format_size`] plus a marker for large sizes.
fn format_size_flagged(bytes: u64) -> String {
    format!("{}{}", format_size(bytes), SizeClass::of(bytes).suffix())
}

// ============================================================================
// Queue
// ============================================================================

fn item_lines(
    index: usize,
    item: &ImageItem,
    selected: bool,
    estimate: Option<u64>,
) -> Vec<String> {
    let (sw, sh) = item.source_dimensions();
    let (tw, th) = item.target();
    let mut header = format!(
        "{} {}  {}x{} -> {}x{}  {}  q{}",
        format_index(index + 1),
        item.display_name(),
        sw,
        sh,
        tw,
        th,
        item.fit_mode(),
        item.quality().value(),
    );
    if item.aspect_lock() {
        header.push_str("  locked");
    }
    if selected {
        header.push_str("  [selected]");
    }

    let mut lines = vec![
        header,
        format!("{}Source: {}", indent(1), format_size_flagged(item.file_size())),
    ];
    if let Some(bytes) = estimate {
        lines.push(format!("{}Estimated: {}", indent(1), format_size_flagged(bytes)));
    }
    let focus = item.focus();
    if (focus.x, focus.y) != (0.5, 0.5) {
        lines.push(format!("{}Focus: {:.2}, {:.2}", indent(1), focus.x, focus.y));
    }
    if let Some(c) = item.crop() {
        lines.push(format!(
            "{}Crop: {},{} {}x{}",
            indent(1),
            c.x,
            c.y,
            c.width,
            c.height
        ));
    }
    lines
}

/// Format the queue with every item's settings.
///
/// `estimates` holds estimated output sizes by queue position; missing or
/// `None` entries print no estimate line.
pub fn format_queue(editor: &Editor, estimates: &[Option<u64>]) -> Vec<String> {
    let queue = editor.queue();
    let mut lines = vec![format!(
        "Queue: {}, {}",
        plural(queue.len(), "image"),
        editor.defaults().format
    )];
    for (i, item) in queue.items().iter().enumerate() {
        let estimate = estimates.get(i).copied().flatten();
        lines.extend(item_lines(i, item, queue.selected() == Some(i), estimate));
    }
    lines
}

pub fn print_queue(editor: &Editor, estimates: &[Option<u64>]) {
    for line in format_queue(editor, estimates) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch progress
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total, format } => {
            vec![format!("Processing {} as {}", plural(*total, "image"), format)]
        }
        BatchEvent::ItemFinished {
            completed,
            total,
            name,
            result,
        } => {
            let status = match result {
                Ok(bytes) => format_size_flagged(*bytes as u64),
                Err(reason) => format!("FAILED {}", reason),
            };
            vec![format!("[{}/{}] {}: {}", completed, total, name, status)]
        }
        BatchEvent::Cancelled { completed, total } => {
            vec![format!("Cancelled after {} of {}", completed, total)]
        }
        BatchEvent::Finished { encoded, failed } => {
            vec![format!("Encoded {}, failed {}", encoded, failed)]
        }
    }
}

// ============================================================================
// Layout
// ============================================================================

/// Format grid positions, one line per item, in canvas coordinates.
pub fn format_layout(layout: &Layout, names: &[&str]) -> Vec<String> {
    if layout.is_empty() {
        return vec!["Layout: empty".to_string()];
    }
    let mut lines = vec![format!(
        "Layout: {}x{} canvas, scale {:.4}",
        layout.canvas.0, layout.canvas.1, layout.scale_factor
    )];
    if layout.scale_factor < 1.0 {
        lines.push(format!(
            "{}Unscaled bounds: {}x{}",
            indent(1),
            layout.bounds.0,
            layout.bounds.1
        ));
    }
    for (i, pos) in layout.positions.iter().enumerate() {
        let slot = pos.scaled(layout.scale_factor);
        let name = names.get(i).copied().unwrap_or("?");
        lines.push(format!(
            "{} {}  at {},{}  {}x{}",
            format_index(i + 1),
            name,
            slot.x,
            slot.y,
            slot.width,
            slot.height
        ));
    }
    lines
}

pub fn print_layout(layout: &Layout, names: &[&str]) {
    for line in format_layout(layout, names) {
        println!("{}", line);
    }
}

// ============================================================================
// Optimizer
// ============================================================================

/// Format the optimizer's choice for one image.
pub fn format_optimize(name: &str, choice: &QualityChoice, target_bytes: u64) -> Vec<String> {
    let mut lines = vec![format!(
        "{}: quality {} ({} at target {})",
        name,
        choice.quality.value(),
        format_size_flagged(choice.measured_bytes),
        format_size(target_bytes)
    )];
    lines.push(format!("{}Probes: {}", indent(1), choice.probes));
    if choice.fell_back {
        lines.push(format!(
            "{}No quality came close to the target; using the fallback",
            indent(1)
        ));
    }
    lines
}

/// Format the estimated output size of one image.
pub fn format_estimate(name: &str, bytes: u64, format: OutputFormat) -> String {
    format!("{}: estimated {} as {}", name, format_size_flagged(bytes), format)
}

pub fn print_optimize(name: &str, choice: &QualityChoice, target_bytes: u64) {
    for line in format_optimize(name, choice, target_bytes) {
        println!("{}", line);
    }
}

// ============================================================================
// Export
// ============================================================================

/// Format what an export wrote into `out_dir`.
pub fn format_export(report: &ExportReport, out_dir: &Path) -> Vec<String> {
    let mut lines: Vec<String> = report
        .files
        .iter()
        .map(|f| {
            format!(
                "{} -> {} ({})",
                f.name,
                out_dir.join(&f.file).display(),
                format_size_flagged(f.bytes as u64)
            )
        })
        .collect();
    lines.push(format!(
        "Wrote {} to {} ({})",
        plural(report.files.len(), "file"),
        out_dir.display(),
        MANIFEST_FILE
    ));
    if report.cancelled {
        lines.push("Batch was cancelled; export is partial".to_string());
    }
    if !report.failures.is_empty() {
        lines.push(format!(
            "Skipped {}:",
            plural(report.failures.len(), "failed image")
        ));
        for failure in &report.failures {
            lines.push(format!("{}{}: {}", indent(1), failure.name, failure.reason));
        }
    }
    lines
}

pub fn print_export(report: &ExportReport, out_dir: &Path) {
    for line in format_export(report, out_dir) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Edit;
    use crate::export::{ExportFailure, ExportedFile};
    use crate::imaging::{CropRect, FocalPoint, OutputFormat, Quality};
    use crate::layout::{LayoutSettings, compute_layout};
    use crate::test_helpers::editor_with_sizes;

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_index_pads_to_three() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn format_size_switches_units_at_one_mb() {
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(0), "0.0 KB");
        assert_eq!(format_size(1024 * 1024 - 1), "1024.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_size(2_621_440), "2.50 MB");
    }

    #[test]
    fn size_class_thresholds() {
        let mb = 1024 * 1024;
        assert_eq!(SizeClass::of(2 * mb), SizeClass::Ok);
        assert_eq!(SizeClass::of(2 * mb + 1), SizeClass::Warning);
        assert_eq!(SizeClass::of(5 * mb), SizeClass::Warning);
        assert_eq!(SizeClass::of(5 * mb + 1), SizeClass::Danger);
    }

    // =========================================================================
    // Queue
    // =========================================================================

    #[test]
    fn queue_lists_items_with_details() {
        let mut editor = editor_with_sizes(&[(640, 480), (300, 200)]);
        editor.apply(Edit::SetFocus(FocalPoint::new(0.25, 0.5))).unwrap();
        editor.apply(Edit::Select(Some(1))).unwrap();
        editor
            .apply(Edit::Crop(CropRect {
                x: 0,
                y: 0,
                width: 100,
                height: 50,
            }))
            .unwrap();
        editor.apply(Edit::SetAspectLock(true)).unwrap();

        let lines = format_queue(&editor, &[]);
        assert_eq!(
            lines,
            vec![
                "Queue: 2 images, webp",
                "001 img1  640x480 -> 640x480  cover  q90",
                "    Source: 1.0 KB",
                "    Focus: 0.25, 0.50",
                "002 img2  300x200 -> 300x200  cover  q90  locked  [selected]",
                "    Source: 1.0 KB",
                "    Crop: 0,0 100x50",
            ]
        );
    }

    #[test]
    fn queue_shows_flagged_estimates() {
        let editor = editor_with_sizes(&[(640, 480), (300, 200), (10, 10)]);
        let lines = format_queue(&editor, &[Some(2048), Some(3 * 1024 * 1024)]);
        assert_eq!(lines[3], "    Estimated: 2.0 KB");
        assert_eq!(lines[6], "    Estimated: 3.00 MB (large)");
        // No estimate for the third item
        assert_eq!(lines.len(), 9);
        assert!(lines[8].starts_with("    Source"));
    }

    #[test]
    fn estimate_line_flags_size_class() {
        assert_eq!(
            format_estimate("dawn", 48 * 1024, OutputFormat::Webp),
            "dawn: estimated 48.0 KB as webp"
        );
        assert_eq!(
            format_estimate("dusk", 6 * 1024 * 1024, OutputFormat::Png),
            "dusk: estimated 6.00 MB (very large) as png"
        );
    }

    // =========================================================================
    // Batch events
    // =========================================================================

    #[test]
    fn batch_events_format() {
        assert_eq!(
            format_batch_event(&BatchEvent::Started {
                total: 1,
                format: OutputFormat::Png
            }),
            vec!["Processing 1 image as png"]
        );
        assert_eq!(
            format_batch_event(&BatchEvent::ItemFinished {
                completed: 2,
                total: 3,
                name: "dawn".into(),
                result: Ok(2048),
            }),
            vec!["[2/3] dawn: 2.0 KB"]
        );
        assert_eq!(
            format_batch_event(&BatchEvent::ItemFinished {
                completed: 3,
                total: 3,
                name: "dusk".into(),
                result: Err("bad".into()),
            }),
            vec!["[3/3] dusk: FAILED bad"]
        );
        assert_eq!(
            format_batch_event(&BatchEvent::Finished {
                encoded: 2,
                failed: 1
            }),
            vec!["Encoded 2, failed 1"]
        );
    }

    // =========================================================================
    // Layout
    // =========================================================================

    #[test]
    fn layout_lines_use_scaled_slots() {
        let layout = compute_layout(&[(100, 50), (60, 60)], &LayoutSettings::default());
        let lines = format_layout(&layout, &["a", "b"]);
        assert_eq!(lines[0], "Layout: 220x100 canvas, scale 1.0000");
        assert_eq!(lines[1], "001 a  at 20,20  100x50");
        assert_eq!(lines[2], "002 b  at 140,20  60x60");
    }

    #[test]
    fn empty_layout() {
        let layout = compute_layout(&[], &LayoutSettings::default());
        assert_eq!(format_layout(&layout, &[]), vec!["Layout: empty"]);
    }

    // =========================================================================
    // Optimizer, export
    // =========================================================================

    #[test]
    fn optimize_mentions_fallback() {
        let choice = QualityChoice {
            quality: Quality::new(80),
            probes: 6,
            measured_bytes: 512 * 1024,
            fell_back: true,
        };
        let lines = format_optimize("dawn", &choice, 200 * 1024);
        assert_eq!(lines[0], "dawn: quality 80 (512.0 KB at target 200.0 KB)");
        assert_eq!(lines[1], "    Probes: 6");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn optimize_flags_large_result() {
        let choice = QualityChoice {
            quality: Quality::new(40),
            probes: 7,
            measured_bytes: 5 * 1024 * 1024 + 1,
            fell_back: false,
        };
        let lines = format_optimize("dawn", &choice, 4 * 1024 * 1024);
        assert_eq!(
            lines[0],
            "dawn: quality 40 (5.00 MB (very large) at target 4.00 MB)"
        );
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn export_lists_files_and_failures() {
        let report = ExportReport {
            format: OutputFormat::Webp,
            mime_type: "image/webp",
            cancelled: false,
            files: vec![ExportedFile {
                name: "dawn".into(),
                file: "dawn.webp".into(),
                bytes: 3 * 1024 * 1024,
            }],
            failures: vec![ExportFailure {
                name: "dusk".into(),
                reason: "bad".into(),
            }],
        };
        let out = Path::new("out");
        let lines = format_export(&report, out);
        assert_eq!(
            lines[0],
            format!(
                "dawn -> {} (3.00 MB (large))",
                out.join("dawn.webp").display()
            )
        );
        assert_eq!(lines[1], "Wrote 1 file to out (manifest.json)");
        assert_eq!(lines[2], "Skipped 1 failed image:");
        assert_eq!(lines[3], "    dusk: bad");
    }
}
