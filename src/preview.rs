//! Preview rendering: the batch contact sheet and single-item previews.
//!
//! Previews always draw from each item's low-resolution `preview` bitmap,
//! through the same [`render_fit`] geometry the export uses.

use crate::imaging::{preview_dimensions, render_fit};
use crate::layout::{Layout, LayoutPosition};
use crate::queue::{BatchQueue, ImageItem};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Sheet background.
pub const SHEET_BACKGROUND: Rgba<u8> = Rgba([0x1a, 0x1a, 0x1a, 0xff]);
/// Outline drawn around the selected item.
pub const SELECTION_COLOR: Rgba<u8> = Rgba([0x8b, 0x5c, 0xf6, 0xff]);
pub const SELECTION_STROKE: u32 = 4;
/// Canvas size used when there is nothing to lay out.
pub const PLACEHOLDER_SIZE: (u32, u32) = (800, 400);

/// Render every queued item into its (scaled) layout slot.
///
/// An empty queue yields a blank [`PLACEHOLDER_SIZE`] canvas.
pub fn render_sheet(queue: &BatchQueue, layout: &Layout) -> RgbaImage {
    if queue.is_empty() || layout.is_empty() {
        return RgbaImage::new(PLACEHOLDER_SIZE.0, PLACEHOLDER_SIZE.1);
    }

    let (cw, ch) = layout.canvas;
    let mut sheet = RgbaImage::from_pixel(cw.max(1), ch.max(1), SHEET_BACKGROUND);

    for (index, (item, pos)) in queue.items().iter().zip(&layout.positions).enumerate() {
        let slot = pos.scaled(layout.scale_factor);
        if slot.width == 0 || slot.height == 0 {
            continue;
        }
        let tile = render_tile(item, (slot.width, slot.height));
        imageops::overlay(&mut sheet, &tile, slot.x as i64, slot.y as i64);

        if queue.selected() == Some(index) {
            stroke_rect(&mut sheet, &slot, SELECTION_STROKE, SELECTION_COLOR);
        }
    }
    sheet
}

/// Preview of one item at its target aspect, capped at `cap` on the long edge.
pub fn render_item_preview(item: &ImageItem, cap: u32) -> RgbaImage {
    let (w, h) = item.target();
    render_tile(item, preview_dimensions(w, h, cap))
}

fn render_tile(item: &ImageItem, size: (u32, u32)) -> RgbaImage {
    let region = item.preview_region();
    render_fit(
        &region,
        size,
        item.fit_mode(),
        item.focus(),
        FilterType::Triangle,
    )
}

/// Outline `rect` with a `width`-pixel stroke centered on its edges,
/// clipped to the canvas.
fn stroke_rect(canvas: &mut RgbaImage, rect: &LayoutPosition, width: u32, color: Rgba<u8>) {
    let half = (width / 2) as i64;
    let left = rect.x as i64 - half;
    let top = rect.y as i64 - half;
    let right = rect.x as i64 + rect.width as i64 + half;
    let bottom = rect.y as i64 + rect.height as i64 + half;
    let inner_left = left + width as i64;
    let inner_top = top + width as i64;
    let inner_right = right - width as i64;
    let inner_bottom = bottom - width as i64;

    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    for y in top.max(0)..bottom.min(ch) {
        for x in left.max(0)..right.min(cw) {
            let inside = x >= inner_left && x < inner_right && y >= inner_top && y < inner_bottom;
            if !inside {
                canvas.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// Coalesces redraw requests: at most one redraw is pending at a time.
///
/// Editors call [`request`](Self::request) after every change; the render
/// loop calls [`take`](Self::take) once per frame and redraws only when it
/// returns true.
#[derive(Debug, Default)]
pub struct RedrawScheduler {
    pending: bool,
}

impl RedrawScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a redraw. Returns true only if none was pending yet.
    pub fn request(&mut self) -> bool {
        !std::mem::replace(&mut self.pending, true)
    }

    /// Consume the pending redraw, if any.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{FitMode, Quality};
    use crate::layout::{LayoutSettings, compute_layout};
    use crate::queue::ItemDefaults;
    use image::DynamicImage;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)))
    }

    fn queue_with(images: Vec<DynamicImage>) -> BatchQueue {
        let mut queue = BatchQueue::new();
        for (i, img) in images.into_iter().enumerate() {
            queue.push(ImageItem::new(
                img,
                0,
                format!("img{i}"),
                &ItemDefaults::default(),
            ));
        }
        queue
    }

    fn sheet_for(queue: &BatchQueue) -> (RgbaImage, Layout) {
        let layout = compute_layout(&queue.target_sizes(), &LayoutSettings::default());
        (render_sheet(queue, &layout), layout)
    }

    #[test]
    fn empty_queue_renders_placeholder() {
        let queue = BatchQueue::new();
        let (sheet, _) = sheet_for(&queue);
        assert_eq!(sheet.dimensions(), PLACEHOLDER_SIZE);
    }

    #[test]
    fn sheet_matches_layout_canvas() {
        let mut queue = queue_with(vec![
            solid(100, 50, [255, 0, 0, 255]),
            solid(60, 60, [0, 255, 0, 255]),
        ]);
        queue.select(None);
        let (sheet, layout) = sheet_for(&queue);
        assert_eq!(sheet.dimensions(), layout.canvas);
        // Spacing shows the background, slots show the items
        assert_eq!(sheet.get_pixel(5, 5), &SHEET_BACKGROUND);
        assert_eq!(sheet.get_pixel(70, 45), &Rgba([255, 0, 0, 255]));
        assert_eq!(sheet.get_pixel(170, 50), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn selected_item_gets_outline() {
        let mut queue = queue_with(vec![
            solid(100, 100, [255, 0, 0, 255]),
            solid(100, 100, [0, 0, 255, 255]),
        ]);
        queue.select(Some(1));
        let (sheet, _) = sheet_for(&queue);
        // Item 1 spans x 140..240; its left edge is outlined, item 0's is not
        assert_eq!(sheet.get_pixel(140, 60), &SELECTION_COLOR);
        assert_eq!(sheet.get_pixel(138, 60), &SELECTION_COLOR);
        assert_eq!(sheet.get_pixel(20, 60), &Rgba([255, 0, 0, 255]));
        // Interior untouched
        assert_eq!(sheet.get_pixel(190, 60), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn scaled_sheet_stays_within_canvas_limit() {
        let queue = queue_with(vec![solid(20000, 100, [9, 9, 9, 255])]);
        let (sheet, layout) = sheet_for(&queue);
        assert!(layout.scale_factor < 1.0);
        assert!(sheet.width() <= 16384);
        assert_eq!(sheet.dimensions(), layout.canvas);
    }

    #[test]
    fn item_preview_keeps_target_aspect() {
        let mut item = ImageItem::new(
            solid(1600, 900, [1, 2, 3, 255]),
            0,
            "x",
            &ItemDefaults {
                quality: Quality::default(),
                fit_mode: FitMode::Contain,
                aspect_lock: false,
                preview_cap: 400,
            },
        );
        item.set_target_dimension(crate::imaging::Axis::Height, Some(1600));
        let preview = render_item_preview(&item, 400);
        assert_eq!(preview.dimensions(), (400, 400));
    }

    // =========================================================================
    // RedrawScheduler
    // =========================================================================

    #[test]
    fn redraw_requests_coalesce() {
        let mut redraw = RedrawScheduler::new();
        assert!(!redraw.take());
        assert!(redraw.request());
        assert!(!redraw.request());
        assert!(!redraw.request());
        assert!(redraw.is_pending());
        assert!(redraw.take());
        assert!(!redraw.take());
        assert!(redraw.request());
    }
}
