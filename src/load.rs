//! Input discovery and decoding.
//!
//! Command-line inputs may be files or directories. Directories are walked
//! recursively and sorted by path so the queue order is stable between runs;
//! files with an unsupported extension inside a directory are skipped, while
//! an explicitly named unsupported file is an error.
//!
//! Decoding fans out across rayon's pool. Results come back in input order,
//! one per path, so a bad file never shifts the items after it.

use crate::imaging::{ImageBackend, is_supported_input};
use crate::naming::display_name_from_path;
use image::DynamicImage;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Input not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Unsupported image type: {}", .0.display())]
    Unsupported(PathBuf),
    #[error("No images found in the given inputs")]
    NoInputs,
    #[error("Image has no pixels: {}", .0.display())]
    Empty(PathBuf),
    #[error("{}: {source}", .path.display())]
    Backend {
        path: PathBuf,
        source: crate::imaging::BackendError,
    },
}

/// A decoded input ready to be queued.
#[derive(Debug)]
pub struct LoadedImage {
    pub path: PathBuf,
    /// File name with extension, used to match `[[items]]` overrides.
    pub file_name: String,
    pub display_name: String,
    pub file_size: u64,
    pub image: DynamicImage,
}

/// Expand `inputs` into the ordered list of image files to load.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).follow_links(true).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() && is_supported_input(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        } else if input.is_file() {
            if !is_supported_input(input) {
                return Err(LoadError::Unsupported(input.clone()));
            }
            files.push(input.clone());
        } else {
            return Err(LoadError::NotFound(input.clone()));
        }
    }
    if files.is_empty() {
        return Err(LoadError::NoInputs);
    }
    debug!(count = files.len(), "collected inputs");
    Ok(files)
}

/// Decode one file.
///
/// Dimensions are checked with `identify` first so a zero-area image is
/// rejected before paying for a full decode.
pub fn load_image(backend: &impl ImageBackend, path: &Path) -> Result<LoadedImage, LoadError> {
    let backend_err = |source| LoadError::Backend {
        path: path.to_path_buf(),
        source,
    };
    let dims = backend.identify(path).map_err(backend_err)?;
    if dims.width == 0 || dims.height == 0 {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    let image = backend.decode(path).map_err(backend_err)?;
    let file_size = fs::metadata(path)?.len();
    debug!(path = %path.display(), width = dims.width, height = dims.height, file_size, "decoded");
    Ok(LoadedImage {
        path: path.to_path_buf(),
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        display_name: display_name_from_path(path),
        file_size,
        image,
    })
}

/// Decode every path in parallel. One result per path, in input order.
pub fn load_images(
    backend: &impl ImageBackend,
    paths: &[PathBuf],
) -> Vec<Result<LoadedImage, LoadError>> {
    paths
        .par_iter()
        .map(|path| load_image(backend, path))
        .collect()
}

/// Keep the images that loaded, logging the ones that did not.
pub fn successful(results: Vec<Result<LoadedImage, LoadError>>) -> Vec<LoadedImage> {
    results
        .into_iter()
        .filter_map(|r| r.inspect_err(|e| warn!("skipping input: {e}")).ok())
        .collect()
}
