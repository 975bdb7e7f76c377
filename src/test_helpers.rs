//! Shared test utilities for the batchfit test suite.
//!
//! Provides synthetic images (in memory and on disk) and builders for
//! editors pre-loaded with items, so module tests don't repeat setup.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut editor = editor_with_sizes(&[(1600, 900), (900, 1600)]);
//! editor.apply(Edit::Select(Some(1))).unwrap();
//! assert_eq!(item_targets(&editor), vec![(1600, 900), (900, 1600)]);
//! ```

use crate::editor::{Editor, GlobalDefaults};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::Path;

// =========================================================================
// Synthetic images
// =========================================================================

/// An opaque RGBA gradient. Varies on both axes so encoders can't collapse it.
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = ((x + y) % 256) as u8;
        Rgba([r, g, b, 255])
    }))
}

/// A blank image of the given size; cheap stand-in for a decoded source.
pub fn blank_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::new(width, height))
}

/// Write a small JPEG to `path`.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    img.save(path).unwrap();
}

/// Write a small PNG to `path`.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    gradient_image(width, height).save(path).unwrap();
}

// =========================================================================
// Editor builders
// =========================================================================

/// Editor with default settings and one blank item per size, named `img1`, `img2`, ...
pub fn editor_with_sizes(sizes: &[(u32, u32)]) -> Editor {
    editor_with_defaults(GlobalDefaults::default(), sizes)
}

/// Like [`editor_with_sizes`] but starting from custom global defaults.
pub fn editor_with_defaults(defaults: GlobalDefaults, sizes: &[(u32, u32)]) -> Editor {
    let mut editor = Editor::new(defaults);
    for (i, (w, h)) in sizes.iter().enumerate() {
        editor.add_item(blank_image(*w, *h), 1024, format!("img{}", i + 1));
    }
    editor
}

/// Target dimensions of every queued item, in queue order.
pub fn item_targets(editor: &Editor) -> Vec<(u32, u32)> {
    editor
        .queue()
        .items()
        .iter()
        .map(|i| (i.target_width(), i.target_height()))
        .collect()
}
