//! The per-image record and the ordered batch queue.
//!
//! Every [`ImageItem`] owns two bitmaps with a fixed derivation rule:
//!
//! - `source`: the full-resolution decode, used only for export.
//! - `preview`: `source` downscaled to at most `preview_cap` on the long
//!   edge, used for every interactive redraw.
//!
//! Aspect math and crop coordinates always refer to `source`; the preview's
//! rounded dimensions never feed back into target sizes.
//!
//! Fields are private so the invariants (positive targets, quality in
//! 1–100, focus in the unit square, crop inside the source) hold for any
//! item reachable through the public API.

use crate::imaging::{
    Axis, CropRect, FitMode, FocalPoint, Quality, clamp01, cropped, locked_counterpart,
    make_preview,
};
use image::DynamicImage;
use std::borrow::Cow;

/// Settings a new item inherits from the global defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemDefaults {
    pub quality: Quality,
    pub fit_mode: FitMode,
    pub aspect_lock: bool,
    pub preview_cap: u32,
}

impl Default for ItemDefaults {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            fit_mode: FitMode::default(),
            aspect_lock: false,
            preview_cap: 400,
        }
    }
}

/// One queued image and its export settings.
#[derive(Debug, Clone)]
pub struct ImageItem {
    source: DynamicImage,
    preview: DynamicImage,
    display_name: String,
    file_size: u64,
    target_width: u32,
    target_height: u32,
    size_overridden: bool,
    quality: Quality,
    fit_mode: FitMode,
    aspect_lock: bool,
    focus: FocalPoint,
    crop: Option<CropRect>,
    processed: bool,
}

impl ImageItem {
    /// Wrap a decoded image. Target size defaults to the source size.
    pub fn new(
        source: DynamicImage,
        file_size: u64,
        display_name: impl Into<String>,
        defaults: &ItemDefaults,
    ) -> Self {
        let preview = make_preview(&source, defaults.preview_cap);
        let (w, h) = (source.width().max(1), source.height().max(1));
        Self {
            source,
            preview,
            display_name: display_name.into(),
            file_size,
            target_width: w,
            target_height: h,
            size_overridden: false,
            quality: defaults.quality,
            fit_mode: defaults.fit_mode,
            aspect_lock: defaults.aspect_lock,
            focus: FocalPoint::CENTER,
            crop: None,
            processed: false,
        }
    }

    pub fn source(&self) -> &DynamicImage {
        &self.source
    }

    pub fn preview(&self) -> &DynamicImage {
        &self.preview
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Size of the file the item was loaded from, in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn target_width(&self) -> u32 {
        self.target_width
    }

    pub fn target_height(&self) -> u32 {
        self.target_height
    }

    pub fn target(&self) -> (u32, u32) {
        (self.target_width, self.target_height)
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn fit_mode(&self) -> FitMode {
        self.fit_mode
    }

    pub fn aspect_lock(&self) -> bool {
        self.aspect_lock
    }

    pub fn focus(&self) -> FocalPoint {
        self.focus
    }

    pub fn crop(&self) -> Option<CropRect> {
        self.crop
    }

    pub fn is_processed(&self) -> bool {
        self.processed
    }

    /// Full source dimensions, ignoring any crop.
    pub fn source_dimensions(&self) -> (u32, u32) {
        (self.source.width(), self.source.height())
    }

    /// Dimensions of the region that gets fitted: the crop if set, else the source.
    pub fn effective_dimensions(&self) -> (u32, u32) {
        match self.crop {
            Some(c) => (c.width, c.height),
            None => self.source_dimensions(),
        }
    }

    fn effective_aspect(&self) -> f64 {
        let (w, h) = self.effective_dimensions();
        w as f64 / h.max(1) as f64
    }

    /// Full-resolution pixels that get fitted into the target box.
    pub fn source_region(&self) -> Cow<'_, DynamicImage> {
        cropped(&self.source, self.crop)
    }

    /// Preview pixels matching [`source_region`](Self::source_region).
    pub fn preview_region(&self) -> Cow<'_, DynamicImage> {
        let crop = self.crop.map(|c| {
            c.rescale(
                self.source_dimensions(),
                (self.preview.width(), self.preview.height()),
            )
        });
        cropped(&self.preview, crop)
    }

    /// Edit one target axis.
    ///
    /// `None` stands for input that is not a positive integer: it is ignored,
    /// unless the size was never set explicitly, in which case the axis falls
    /// back to the source dimension. With aspect lock on, the other axis
    /// follows the source aspect ratio.
    pub fn set_target_dimension(&mut self, axis: Axis, value: Option<u32>) {
        match value.filter(|v| *v > 0) {
            Some(v) => {
                self.size_overridden = true;
                self.apply_dimension(axis, v);
            }
            None if !self.size_overridden => {
                let (w, h) = self.effective_dimensions();
                match axis {
                    Axis::Width => self.target_width = w.max(1),
                    Axis::Height => self.target_height = h.max(1),
                }
            }
            None => {}
        }
    }

    fn apply_dimension(&mut self, axis: Axis, value: u32) {
        let other = self
            .aspect_lock
            .then(|| locked_counterpart(axis, value, self.effective_aspect()));
        match axis {
            Axis::Width => {
                self.target_width = value;
                if let Some(h) = other {
                    self.target_height = h;
                }
            }
            Axis::Height => {
                self.target_height = value;
                if let Some(w) = other {
                    self.target_width = w;
                }
            }
        }
    }

    pub fn set_quality(&mut self, quality: Quality) {
        self.quality = quality;
    }

    pub fn set_fit_mode(&mut self, mode: FitMode) {
        self.fit_mode = mode;
    }

    pub fn set_aspect_lock(&mut self, lock: bool) {
        self.aspect_lock = lock;
    }

    pub fn set_focus(&mut self, focus: FocalPoint) {
        self.focus = FocalPoint::new(focus.x, focus.y);
    }

    /// Move the focal point for a drag of `(dx, dy)` pixels since `start`.
    ///
    /// Pan semantics: dragging right reveals content further left, so the
    /// delta is subtracted.
    pub fn pan_focus(&mut self, start: FocalPoint, dx: f64, dy: f64, sensitivity: f64) {
        self.focus = FocalPoint {
            x: clamp01(start.x - dx * sensitivity),
            y: clamp01(start.y - dy * sensitivity),
        };
    }

    /// Crop to `rect` (clipped to the source). Returns the applied crop, or
    /// `None` if nothing of `rect` lies inside the source; the item is then
    /// left untouched. Target dimensions are kept.
    pub fn set_crop(&mut self, rect: CropRect) -> Option<CropRect> {
        let (w, h) = self.source_dimensions();
        let clipped = rect.clamp_to(w, h)?;
        self.crop = Some(clipped);
        Some(clipped)
    }

    pub fn reset_crop(&mut self) {
        self.crop = None;
    }

    pub(crate) fn set_processed(&mut self, processed: bool) {
        self.processed = processed;
    }
}

/// Ordered items plus the selection that the control panel edits.
///
/// Insertion order is grid order and export order.
#[derive(Debug, Clone, Default)]
pub struct BatchQueue {
    items: Vec<ImageItem>,
    selected: Option<usize>,
}

impl BatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[ImageItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ImageItem> {
        self.items.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut ImageItem> {
        self.items.get_mut(index)
    }

    pub(crate) fn items_mut(&mut self) -> impl Iterator<Item = &mut ImageItem> {
        self.items.iter_mut()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&ImageItem> {
        self.selected.and_then(|i| self.items.get(i))
    }

    pub(crate) fn selected_item_mut(&mut self) -> Option<&mut ImageItem> {
        self.selected.and_then(|i| self.items.get_mut(i))
    }

    /// Append an item and return its index. The first item becomes selected.
    pub fn push(&mut self, item: ImageItem) -> usize {
        self.items.push(item);
        if self.items.len() == 1 {
            self.selected = Some(0);
        }
        self.items.len() - 1
    }

    /// Remove the item at `index`, keeping the selection on the same item
    /// when it survives. Removing the selected item drops the selection.
    pub fn remove(&mut self, index: usize) -> Option<ImageItem> {
        if index >= self.items.len() {
            return None;
        }
        let item = self.items.remove(index);
        self.selected = match self.selected {
            Some(s) if s == index => None,
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        Some(item)
    }

    /// Select an item (or `None` for global mode). Returns false for an
    /// out-of-range index, leaving the selection unchanged.
    pub fn select(&mut self, index: Option<usize>) -> bool {
        match index {
            Some(i) if i >= self.items.len() => false,
            other => {
                self.selected = other;
                true
            }
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.selected = None;
    }

    /// Target sizes in queue order, the input to layout.
    pub fn target_sizes(&self) -> Vec<(u32, u32)> {
        self.items.iter().map(ImageItem::target).collect()
    }
}
