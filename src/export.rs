//! Writing batch results to disk.
//!
//! Each encoded entry becomes one file in the output directory, named by
//! [`export_filename`]; failed entries are skipped and listed instead. A
//! `manifest.json` next to the files records what was written:
//!
//! ```json
//! {
//!   "format": "webp",
//!   "mime_type": "image/webp",
//!   "cancelled": false,
//!   "files": [{ "name": "dawn", "file": "dawn.webp", "bytes": 48213 }],
//!   "failures": [{ "name": "dusk", "reason": "Encode failed: ..." }]
//! }
//! ```

use crate::batch::{BatchResults, EncodeOutcome, ExportFile};
use crate::imaging::OutputFormat;
use crate::naming::{dedupe_filename, export_filename};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing to export: process the batch first")]
    NothingToExport,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFile {
    /// Display name of the item.
    pub name: String,
    /// File name written in the output directory.
    pub file: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportFailure {
    pub name: String,
    pub reason: String,
}

/// What an export wrote. Serialized as the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub format: OutputFormat,
    pub mime_type: &'static str,
    pub cancelled: bool,
    pub files: Vec<ExportedFile>,
    pub failures: Vec<ExportFailure>,
}

/// Named files for every encoded entry, in queue order.
///
/// Numbering follows queue position, so a failed item leaves a gap rather
/// than renumbering the items after it.
pub fn export_files(results: &BatchResults, prefix: &str) -> Vec<ExportFile> {
    let mut taken = HashSet::new();
    results
        .entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| match &entry.outcome {
            EncodeOutcome::Encoded(bytes) => Some(ExportFile {
                name: dedupe_filename(
                    export_filename(prefix, i, &entry.display_name, results.format),
                    &mut taken,
                ),
                bytes: bytes.clone(),
            }),
            EncodeOutcome::Failed(_) => None,
        })
        .collect()
}

/// Write all encoded entries and the manifest into `out_dir`.
///
/// Refuses with [`ExportError::NothingToExport`] when no entry was encoded.
pub fn export_results(
    results: &BatchResults,
    prefix: &str,
    out_dir: &Path,
) -> Result<ExportReport, ExportError> {
    if results.encoded_count() == 0 {
        return Err(ExportError::NothingToExport);
    }
    fs::create_dir_all(out_dir)?;

    let encoded = results
        .entries
        .iter()
        .filter(|e| matches!(e.outcome, EncodeOutcome::Encoded(_)));
    let mut files = Vec::new();
    for (file, entry) in export_files(results, prefix).into_iter().zip(encoded) {
        fs::write(out_dir.join(&file.name), &file.bytes)?;
        files.push(ExportedFile {
            name: entry.display_name.clone(),
            file: file.name,
            bytes: file.bytes.len(),
        });
    }

    let report = ExportReport {
        format: results.format,
        mime_type: results.format.mime_type(),
        cancelled: results.cancelled,
        files,
        failures: results
            .failures()
            .into_iter()
            .map(|(name, reason)| ExportFailure {
                name: name.to_string(),
                reason: reason.to_string(),
            })
            .collect(),
    };
    fs::write(
        manifest_path(out_dir),
        serde_json::to_string_pretty(&report)?,
    )?;
    info!(files = report.files.len(), dir = %out_dir.display(), "export written");
    Ok(report)
}

pub fn manifest_path(out_dir: &Path) -> PathBuf {
    out_dir.join(MANIFEST_FILE)
}

/// Write a single file (the process-selected path) into `out_dir`.
pub fn write_file(file: &ExportFile, out_dir: &Path) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(&file.name);
    fs::write(&path, &file.bytes)?;
    Ok(path)
}
