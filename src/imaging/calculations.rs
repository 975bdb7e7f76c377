//! Pure calculation functions for image geometry.
//!
//! All functions here are pure and testable without any I/O or images. The
//! same [`fit_rect`] serves the low-resolution preview and the
//! full-resolution export; only the source size and target box differ.

use super::params::{FitMode, FocalPoint};

/// Where a scaled source lands relative to the top-left of its target box.
///
/// Offsets are negative when Cover crops: the part of the scaled source
/// left of / above the box is cut away.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRect {
    pub width: f64,
    pub height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

/// A [`DrawRect`] snapped to whole pixels for raster composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub width: u32,
    pub height: u32,
    pub offset_x: i64,
    pub offset_y: i64,
}

impl DrawRect {
    /// Round to integer size (at least 1px) and offsets.
    pub fn to_pixels(self) -> PixelRect {
        PixelRect {
            width: (self.width.round() as u32).max(1),
            height: (self.height.round() as u32).max(1),
            offset_x: self.offset_x.round() as i64,
            offset_y: self.offset_y.round() as i64,
        }
    }
}

/// Compute how a `source` image is drawn into a `target` box.
///
/// # Arguments
/// * `source` - Source dimensions (width, height), both > 0
/// * `target` - Target box dimensions (width, height), both > 0
/// * `mode` - [`FitMode::Contain`] letterboxes, [`FitMode::Cover`] crops
/// * `focus` - Consulted only by Cover; expected already clamped to `[0, 1]`
///
/// The aspect comparison is a strict `>`: when source and target share an
/// aspect ratio both modes take the second branch (width-driven for Cover,
/// height-driven for Contain), which yields the exact target size.
///
/// # Examples
/// ```
/// use batchfit::imaging::{FitMode, FocalPoint, fit_rect};
/// // 400x200 into a 100x100 box, cropped and centered
/// let r = fit_rect((400, 200), (100, 100), FitMode::Cover, FocalPoint::CENTER);
/// assert_eq!((r.width, r.height), (200.0, 100.0));
/// assert_eq!(r.offset_x, -50.0);
/// ```
pub fn fit_rect(
    source: (u32, u32),
    target: (u32, u32),
    mode: FitMode,
    focus: FocalPoint,
) -> DrawRect {
    let (src_w, src_h) = (source.0 as f64, source.1 as f64);
    let (tgt_w, tgt_h) = (target.0 as f64, target.1 as f64);

    let src_aspect = src_w / src_h;
    let tgt_aspect = tgt_w / tgt_h;

    match mode {
        FitMode::Contain => {
            if src_aspect > tgt_aspect {
                // Source is wider: width fills, letterbox top/bottom
                let height = tgt_w / src_aspect;
                DrawRect {
                    width: tgt_w,
                    height,
                    offset_x: 0.0,
                    offset_y: (tgt_h - height) / 2.0,
                }
            } else {
                // Source is taller (or same shape): height fills, pillarbox
                let width = tgt_h * src_aspect;
                DrawRect {
                    width,
                    height: tgt_h,
                    offset_x: (tgt_w - width) / 2.0,
                    offset_y: 0.0,
                }
            }
        }
        FitMode::Cover => {
            if src_aspect > tgt_aspect {
                // Source is wider: height fills, crop width by focus.x
                let width = tgt_h * src_aspect;
                DrawRect {
                    width,
                    height: tgt_h,
                    offset_x: -((width - tgt_w) * focus.x),
                    offset_y: 0.0,
                }
            } else {
                // Source is taller: width fills, crop height by focus.y
                let height = tgt_w / src_aspect;
                DrawRect {
                    width: tgt_w,
                    height,
                    offset_x: 0.0,
                    offset_y: -((height - tgt_h) * focus.y),
                }
            }
        }
    }
}

/// Dimensions of a preview capped at `cap` on its long edge.
///
/// Images already within the cap keep their size, so the preview is never
/// larger than its source on either axis.
///
/// ```
/// # use batchfit::imaging::preview_dimensions;
/// assert_eq!(preview_dimensions(4000, 3000, 400), (400, 300));
/// assert_eq!(preview_dimensions(300, 200, 400), (300, 200));
/// ```
pub fn preview_dimensions(width: u32, height: u32, cap: u32) -> (u32, u32) {
    if width <= cap && height <= cap {
        return (width, height);
    }
    let aspect = width as f64 / height as f64;
    if width > height {
        let h = (cap as f64 / aspect).round() as u32;
        (cap, h.clamp(1, height))
    } else {
        let w = (cap as f64 * aspect).round() as u32;
        (w.clamp(1, width), cap)
    }
}

/// Shrink a layout box so its long edge is at most `cap`, keeping aspect.
///
/// Used by the layout engine for large batches. Landscape boxes cap the
/// width, portrait and square boxes cap the height; both sides are rounded.
pub fn thumbnail_box(width: u32, height: u32, cap: u32) -> (u32, u32) {
    let aspect = width as f64 / height as f64;
    let (w, h) = if width > height {
        let w = width.min(cap) as f64;
        (w, w / aspect)
    } else {
        let h = height.min(cap) as f64;
        (h * aspect, h)
    };
    ((w.round() as u32).max(1), (h.round() as u32).max(1))
}

/// Target axis being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

/// The other axis when aspect lock is on: editing the width to `value`
/// yields `round(value / aspect)` for the height, editing the height yields
/// `round(value * aspect)` for the width. Never returns 0.
pub fn locked_counterpart(axis: Axis, value: u32, source_aspect: f64) -> u32 {
    let other = match axis {
        Axis::Width => value as f64 / source_aspect,
        Axis::Height => value as f64 * source_aspect,
    };
    (other.round() as u32).max(1)
}
