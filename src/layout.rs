//! Grid layout for the batch preview sheet.
//!
//! Items are packed left-to-right into a square-ish grid
//! (`columns = ceil(sqrt(n))`), each row as tall as its tallest box, with a
//! fixed spacing around and between boxes:
//!
//! ```text
//! (spacing, spacing)
//!   ┌──────┐  ┌───┐  ┌────────┐
//!   │  0   │  │ 1 │  │   2    │      row height = tallest box
//!   └──────┘  │   │  └────────┘
//!             └───┘
//!   ┌────┐  ┌──────┐
//!   │ 3  │  │  4   │
//!   └────┘  └──────┘
//! ```
//!
//! Large batches (more than `thumbnail_threshold` items) shrink every box to
//! `thumbnail_cap` on its long edge first. If the resulting sheet would exceed
//! `max_canvas` on either axis, the layout reports a uniform `scale_factor`
//! but leaves positions untouched; renderers apply it via
//! [`LayoutPosition::scaled`].
//!
//! Layout is a pure function of the ordered sizes and the settings, so it is
//! recomputed from scratch on every request.

use crate::imaging::thumbnail_box;
use serde::Serialize;

/// Knobs for [`compute_layout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSettings {
    /// Gap around and between boxes, in canvas pixels.
    pub spacing: u32,
    /// Largest allowed canvas extent on either axis.
    pub max_canvas: u32,
    /// Long-edge cap for boxes when the batch is large.
    pub thumbnail_cap: u32,
    /// Item count above which boxes are shrunk to `thumbnail_cap`.
    pub thumbnail_threshold: usize,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            spacing: 20,
            max_canvas: 16384,
            thumbnail_cap: 200,
            thumbnail_threshold: 12,
        }
    }
}

/// One item's box in unscaled canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutPosition {
    pub x: u64,
    pub y: u64,
    pub width: u32,
    pub height: u32,
}

impl LayoutPosition {
    /// Apply a layout scale factor, flooring every component.
    pub fn scaled(&self, scale: f64) -> LayoutPosition {
        let f = |v: f64| (v * scale).floor();
        LayoutPosition {
            x: f(self.x as f64) as u64,
            y: f(self.y as f64) as u64,
            width: f(self.width as f64) as u32,
            height: f(self.height as f64) as u32,
        }
    }

    fn contains_scaled(&self, scale: f64, px: f64, py: f64) -> bool {
        let x = self.x as f64 * scale;
        let y = self.y as f64 * scale;
        let w = self.width as f64 * scale;
        let h = self.height as f64 * scale;
        px >= x && px <= x + w && py >= y && py <= y + h
    }
}

/// Result of [`compute_layout`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    /// One box per input size, same order.
    pub positions: Vec<LayoutPosition>,
    /// `1.0`, or the uniform shrink needed to fit `max_canvas`.
    pub scale_factor: f64,
    /// Unscaled sheet size, trailing spacing included. Wider than `u32`
    /// because boxes of any `u32` size can be laid side by side.
    pub bounds: (u64, u64),
    /// Sheet size after applying `scale_factor` (floored).
    pub canvas: (u32, u32),
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Index of the item under canvas point `(x, y)`.
    ///
    /// `(x, y)` is in scaled canvas pixels. Edges count as inside, and when
    /// boxes overlap the later item wins.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<usize> {
        self.positions
            .iter()
            .rposition(|p| p.contains_scaled(self.scale_factor, x, y))
    }
}

/// Lay out boxes of the given `(width, height)` sizes in queue order.
pub fn compute_layout(sizes: &[(u32, u32)], settings: &LayoutSettings) -> Layout {
    if sizes.is_empty() {
        return Layout {
            positions: Vec::new(),
            scale_factor: 1.0,
            bounds: (0, 0),
            canvas: (0, 0),
        };
    }

    let count = sizes.len();
    let use_thumbnails = count > settings.thumbnail_threshold;
    let columns = (count as f64).sqrt().ceil() as usize;
    let spacing = u64::from(settings.spacing);

    let mut positions = Vec::with_capacity(count);
    let mut x = spacing;
    let mut y = spacing;
    let mut row_height = 0u64;

    for (i, &(w, h)) in sizes.iter().enumerate() {
        let (w, h) = if use_thumbnails {
            thumbnail_box(w, h, settings.thumbnail_cap)
        } else {
            (w, h)
        };

        if i > 0 && i % columns == 0 {
            x = spacing;
            y += row_height + spacing;
            row_height = 0;
        }

        positions.push(LayoutPosition {
            x,
            y,
            width: w,
            height: h,
        });

        x += u64::from(w) + spacing;
        row_height = row_height.max(u64::from(h));
    }

    let max_right = positions
        .iter()
        .map(|p| p.x + u64::from(p.width))
        .max()
        .unwrap_or(0);
    let max_bottom = positions
        .iter()
        .map(|p| p.y + u64::from(p.height))
        .max()
        .unwrap_or(0);
    let bounds = (max_right + spacing, max_bottom + spacing);

    let max = settings.max_canvas as f64;
    let (bw, bh) = (bounds.0 as f64, bounds.1 as f64);
    let scale_factor = if bw > max || bh > max {
        (max / bw).min(max / bh)
    } else {
        1.0
    };
    let canvas = (
        (bw * scale_factor).floor() as u32,
        (bh * scale_factor).floor() as u32,
    );

    Layout {
        positions,
        scale_factor,
        bounds,
        canvas,
    }
}
