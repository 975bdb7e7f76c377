//! High-level image operations.
//!
//! These functions combine the geometry in
//! [`calculations`](super::calculations) with raster work on `image`
//! buffers. Preview sheets and full-resolution exports both go through
//! [`render_fit`], so they crop identically.

use super::calculations::{fit_rect, preview_dimensions};
use super::params::{CropRect, FitMode, FocalPoint};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use std::borrow::Cow;

/// Derive the low-resolution preview kept next to each full-resolution source.
pub fn make_preview(source: &DynamicImage, cap: u32) -> DynamicImage {
    let (w, h) = preview_dimensions(source.width(), source.height(), cap);
    if (w, h) == (source.width(), source.height()) {
        return source.clone();
    }
    source.resize_exact(w, h, FilterType::Triangle)
}

/// The region of `image` an item actually uses: the crop if any, else all of it.
pub fn cropped(image: &DynamicImage, crop: Option<CropRect>) -> Cow<'_, DynamicImage> {
    match crop {
        Some(c) => Cow::Owned(image.crop_imm(c.x, c.y, c.width, c.height)),
        None => Cow::Borrowed(image),
    }
}

/// Draw `source` into a transparent `target`-sized canvas.
///
/// Contain resamples the source to the rounded [`fit_rect`] size and places
/// it at the rounded offset. Cover only ever shows a window of the source,
/// so that window is cut out first and resampled straight to `target`.
pub fn render_fit(
    source: &DynamicImage,
    target: (u32, u32),
    mode: FitMode,
    focus: FocalPoint,
    filter: FilterType,
) -> RgbaImage {
    let (src_w, src_h) = (source.width(), source.height());
    let rect = fit_rect((src_w, src_h), target, mode, focus);
    match mode {
        FitMode::Cover => {
            let scale = rect.width / src_w as f64;
            let x = window_start(-rect.offset_x / scale, src_w);
            let y = window_start(-rect.offset_y / scale, src_h);
            let w = window_span(target.0 as f64 / scale, src_w - x);
            let h = window_span(target.1 as f64 / scale, src_h - y);
            source
                .crop_imm(x, y, w, h)
                .resize_exact(target.0, target.1, filter)
                .to_rgba8()
        }
        FitMode::Contain => {
            let rect = rect.to_pixels();
            let scaled = source.resize_exact(rect.width, rect.height, filter).to_rgba8();
            let mut canvas = RgbaImage::new(target.0, target.1);
            imageops::overlay(&mut canvas, &scaled, rect.offset_x, rect.offset_y);
            canvas
        }
    }
}

fn window_start(v: f64, len: u32) -> u32 {
    (v.round().max(0.0) as u32).min(len.saturating_sub(1))
}

fn window_span(v: f64, available: u32) -> u32 {
    (v.round() as u32).clamp(1, available.max(1))
}
