//! The control-panel reducer.
//!
//! One shared set of controls edits either the global defaults or the
//! selected item. Which one is an explicit [`EditMode`], derived from the
//! queue's selection, and every control change is an [`Edit`] applied
//! through [`Editor::apply`]:
//!
//! | Edit | Item selected | No selection |
//! |---|---|---|
//! | `SetDimension` | that item (aspect lock aware) | global size, applied to every item |
//! | `SetQuality` | that item | global default |
//! | `SetFitMode`, `SetAspectLock` | that item | global default |
//! | `SetFocus`, focus drags, `Crop`, `ResetCrop` | that item | [`EditError::NoSelection`] |
//! | `SetSpacing`, `SetFormat`, `SetPrefix` | global | global |
//!
//! With the quality scope set to "all", `SetQuality` writes every item
//! regardless of mode.
//!
//! The editor also owns the latest batch results and a
//! [`RedrawScheduler`]: every successful change requests a redraw, and
//! bursts of changes coalesce into one.

use crate::batch::{self, BatchEvent, BatchResults, BatchState, ExportFile};
use crate::export::{self, ExportError, ExportReport};
use crate::imaging::{
    Axis, BackendError, CropRect, EncodeParams, FitMode, FocalPoint, ImageBackend, OutputFormat,
    Quality,
};
use crate::layout::{Layout, LayoutSettings, compute_layout};
use crate::naming::export_filename;
use crate::optimize::{QualityChoice, optimize_quality};
use crate::preview::{self, RedrawScheduler};
use crate::queue::{BatchQueue, ImageItem, ItemDefaults};
use image::{DynamicImage, RgbaImage};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum EditError {
    #[error("No image selected")]
    NoSelection,
    #[error("No image at position {0}")]
    NoSuchItem(usize),
    #[error("Crop region lies outside the image")]
    InvalidCrop,
    #[error("Image processing failed: {0}")]
    Backend(#[from] BackendError),
}

/// What the shared controls currently edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    GlobalDefaults,
    Item(usize),
}

/// A single control-panel change.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// `None` is input that is not a positive integer (see [`parse_dimension`]).
    SetDimension { axis: Axis, value: Option<u32> },
    SetQuality(Quality),
    /// Turning "apply quality to all" on pushes the current quality to every item.
    SetQualityScope(bool),
    SetFitMode(FitMode),
    SetAspectLock(bool),
    SetFocus(FocalPoint),
    BeginFocusDrag,
    /// Pointer movement in pixels since the drag began.
    DragFocus { dx: f64, dy: f64 },
    EndFocusDrag,
    Select(Option<usize>),
    /// Select whatever lies under a point on the rendered sheet.
    SelectAt { x: f64, y: f64 },
    SetSpacing(u32),
    SetFormat(OutputFormat),
    SetPrefix(String),
    Crop(CropRect),
    ResetCrop,
}

/// Settings that apply when no item is selected, and to new items.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalDefaults {
    pub quality: Quality,
    pub fit_mode: FitMode,
    pub aspect_lock: bool,
    /// Batch-wide width applied to every item when edited in global mode.
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub prefix: String,
    /// "Apply quality to all images".
    pub quality_all: bool,
    /// Focus change per dragged pixel.
    pub drag_sensitivity: f64,
    pub layout: LayoutSettings,
    pub preview_cap: u32,
}

impl Default for GlobalDefaults {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            fit_mode: FitMode::default(),
            aspect_lock: false,
            width: 800,
            height: 800,
            format: OutputFormat::default(),
            prefix: String::new(),
            quality_all: false,
            drag_sensitivity: 0.002,
            layout: LayoutSettings::default(),
            preview_cap: 400,
        }
    }
}

impl GlobalDefaults {
    fn item_defaults(&self) -> ItemDefaults {
        ItemDefaults {
            quality: self.quality,
            fit_mode: self.fit_mode,
            aspect_lock: self.aspect_lock,
            preview_cap: self.preview_cap,
        }
    }
}

/// Parse a dimension field. Anything but a positive integer is `None`.
pub fn parse_dimension(input: &str) -> Option<u32> {
    input.trim().parse::<u32>().ok().filter(|v| *v > 0)
}

#[derive(Debug, Clone, Copy)]
struct FocusDrag {
    index: usize,
    start: FocalPoint,
}

/// Queue, global defaults, batch results and redraw state behind one API.
#[derive(Debug)]
pub struct Editor {
    queue: BatchQueue,
    defaults: GlobalDefaults,
    drag: Option<FocusDrag>,
    results: Option<BatchResults>,
    batch_state: BatchState,
    redraw: RedrawScheduler,
}

impl Editor {
    pub fn new(defaults: GlobalDefaults) -> Self {
        Self {
            queue: BatchQueue::new(),
            defaults,
            drag: None,
            results: None,
            batch_state: BatchState::Idle,
            redraw: RedrawScheduler::new(),
        }
    }

    pub fn queue(&self) -> &BatchQueue {
        &self.queue
    }

    pub fn defaults(&self) -> &GlobalDefaults {
        &self.defaults
    }

    pub fn results(&self) -> Option<&BatchResults> {
        self.results.as_ref()
    }

    /// `Idle` until a run returns, then `Completed`. The editor is mutably
    /// borrowed while a run is in progress; its event stream reports `Running`.
    pub fn batch_state(&self) -> BatchState {
        self.batch_state
    }

    pub fn mode(&self) -> EditMode {
        match self.queue.selected() {
            Some(i) => EditMode::Item(i),
            None => EditMode::GlobalDefaults,
        }
    }

    /// Consume the pending redraw request; true means the sheet should be redrawn.
    pub fn take_redraw(&mut self) -> bool {
        self.redraw.take()
    }

    /// Queue a decoded image with the current global defaults. The first
    /// item becomes selected.
    pub fn add_item(
        &mut self,
        source: DynamicImage,
        file_size: u64,
        display_name: impl Into<String>,
    ) -> usize {
        let item = ImageItem::new(
            source,
            file_size,
            display_name,
            &self.defaults.item_defaults(),
        );
        let index = self.queue.push(item);
        self.redraw.request();
        index
    }

    /// Remove the item at `index`. Positions of later items shift down by one.
    pub fn remove_item(&mut self, index: usize) -> Result<ImageItem, EditError> {
        let item = self
            .queue
            .remove(index)
            .ok_or(EditError::NoSuchItem(index))?;
        self.drag = None;
        self.redraw.request();
        Ok(item)
    }

    /// Empty the queue and drop any results, if `confirm` agrees.
    ///
    /// An empty queue clears without asking. Returns whether the queue was
    /// cleared.
    pub fn clear(&mut self, confirm: impl FnOnce() -> bool) -> bool {
        if !self.queue.is_empty() && !confirm() {
            return false;
        }
        self.queue.clear();
        self.results = None;
        self.batch_state = BatchState::Idle;
        self.drag = None;
        self.redraw.request();
        true
    }

    /// Apply one control change.
    pub fn apply(&mut self, edit: Edit) -> Result<(), EditError> {
        debug!(?edit, mode = ?self.mode(), "apply edit");
        match edit {
            Edit::SetDimension { axis, value } => self.set_dimension(axis, value),
            Edit::SetQuality(quality) => self.set_quality(quality),
            Edit::SetQualityScope(all) => {
                self.defaults.quality_all = all;
                if all {
                    let current = self
                        .queue
                        .selected_item()
                        .map_or(self.defaults.quality, ImageItem::quality);
                    self.queue.items_mut().for_each(|i| i.set_quality(current));
                }
            }
            Edit::SetFitMode(mode) => match self.queue.selected_item_mut() {
                Some(item) => item.set_fit_mode(mode),
                None => self.defaults.fit_mode = mode,
            },
            Edit::SetAspectLock(lock) => match self.queue.selected_item_mut() {
                Some(item) => item.set_aspect_lock(lock),
                None => self.defaults.aspect_lock = lock,
            },
            Edit::SetFocus(point) => self.selected_mut()?.set_focus(point),
            Edit::BeginFocusDrag => {
                let index = self.queue.selected().ok_or(EditError::NoSelection)?;
                let item = self.selected_mut()?;
                let (cover, start) = (item.fit_mode() == FitMode::Cover, item.focus());
                // Contain shows the whole image; there is nothing to pan
                self.drag = cover.then_some(FocusDrag { index, start });
            }
            Edit::DragFocus { dx, dy } => {
                let Some(drag) = self.drag else {
                    return Ok(());
                };
                let sensitivity = self.defaults.drag_sensitivity;
                if let Some(item) = self.queue.get_mut(drag.index) {
                    item.pan_focus(drag.start, dx, dy, sensitivity);
                }
            }
            Edit::EndFocusDrag => self.drag = None,
            Edit::Select(index) => {
                if !self.queue.select(index) {
                    return Err(EditError::NoSuchItem(index.unwrap_or_default()));
                }
                self.drag = None;
            }
            Edit::SelectAt { x, y } => {
                let hit = self.layout().hit_test(x, y);
                self.queue.select(hit);
                self.drag = None;
            }
            Edit::SetSpacing(spacing) => {
                if spacing > 0 {
                    self.defaults.layout.spacing = spacing;
                }
            }
            Edit::SetFormat(format) => self.defaults.format = format,
            Edit::SetPrefix(prefix) => self.defaults.prefix = prefix,
            Edit::Crop(rect) => {
                self.selected_mut()?
                    .set_crop(rect)
                    .ok_or(EditError::InvalidCrop)?;
            }
            Edit::ResetCrop => self.selected_mut()?.reset_crop(),
        }
        self.redraw.request();
        Ok(())
    }

    fn selected_mut(&mut self) -> Result<&mut ImageItem, EditError> {
        self.queue
            .selected_item_mut()
            .ok_or(EditError::NoSelection)
    }

    fn set_dimension(&mut self, axis: Axis, value: Option<u32>) {
        if let Some(item) = self.queue.selected_item_mut() {
            item.set_target_dimension(axis, value);
            return;
        }
        // Global mode ignores invalid input outright
        let Some(value) = value.filter(|v| *v > 0) else {
            return;
        };
        match axis {
            Axis::Width => self.defaults.width = value,
            Axis::Height => self.defaults.height = value,
        }
        self.queue
            .items_mut()
            .for_each(|item| item.set_target_dimension(axis, Some(value)));
    }

    fn set_quality(&mut self, quality: Quality) {
        if self.defaults.quality_all {
            self.queue.items_mut().for_each(|i| i.set_quality(quality));
        } else if let Some(item) = self.queue.selected_item_mut() {
            item.set_quality(quality);
        } else {
            self.defaults.quality = quality;
        }
    }

    /// Current grid layout of the queue.
    pub fn layout(&self) -> Layout {
        compute_layout(&self.queue.target_sizes(), &self.defaults.layout)
    }

    /// Render the contact sheet for the current queue and selection.
    pub fn render_sheet(&self) -> RgbaImage {
        preview::render_sheet(&self.queue, &self.layout())
    }

    /// Encode every item in order, replacing any previous results.
    pub fn process_all(
        &mut self,
        backend: &impl ImageBackend,
        cancel: Option<&AtomicBool>,
        events: Option<Sender<BatchEvent>>,
    ) -> &BatchResults {
        self.drag = None;
        let results = batch::process_queue(
            backend,
            &self.queue,
            self.defaults.format,
            cancel,
            events,
        );
        for (item, entry) in self.queue.items_mut().zip(&results.entries) {
            item.set_processed(entry.outcome.bytes().is_some());
        }
        self.batch_state = BatchState::Completed;
        self.results.insert(results)
    }

    /// Encode only the selected item, named as it would be in a full export.
    pub fn process_selected(&mut self, backend: &impl ImageBackend) -> Result<ExportFile, EditError> {
        let index = self.queue.selected().ok_or(EditError::NoSelection)?;
        let format = self.defaults.format;
        let item = self
            .queue
            .selected_item_mut()
            .ok_or(EditError::NoSelection)?;
        let bytes = batch::encode_item(backend, item, format)?;
        item.set_processed(true);
        let name = export_filename(&self.defaults.prefix, index, item.display_name(), format);
        Ok(ExportFile { name, bytes })
    }

    /// Write the latest results into `out_dir`.
    pub fn export(&self, out_dir: &Path) -> Result<ExportReport, ExportError> {
        let results = self.results.as_ref().ok_or(ExportError::NothingToExport)?;
        export::export_results(results, &self.defaults.prefix, out_dir)
    }

    /// Encoded size of the selected item with its own settings in the batch
    /// format. The encoded bytes are discarded.
    pub fn estimate_selected_size(&self, backend: &impl ImageBackend) -> Result<u64, EditError> {
        let index = self.queue.selected().ok_or(EditError::NoSelection)?;
        self.estimate_item_size(backend, index)
    }

    /// Encoded size of the item at `index`, as [`Editor::estimate_selected_size`].
    pub fn estimate_item_size(
        &self,
        backend: &impl ImageBackend,
        index: usize,
    ) -> Result<u64, EditError> {
        let item = self.queue.get(index).ok_or(EditError::NoSuchItem(index))?;
        let bytes = batch::encode_item(backend, item, self.defaults.format)?;
        Ok(bytes.len() as u64)
    }

    /// Pick a quality for the selected item that lands near `target_bytes`
    /// in the current format, and apply it to that item.
    pub fn optimize_selected_quality(
        &mut self,
        backend: &impl ImageBackend,
        target_bytes: u64,
    ) -> Result<QualityChoice, EditError> {
        let format = self.defaults.format;
        let item = self
            .queue
            .selected_item_mut()
            .ok_or(EditError::NoSelection)?;
        let canvas = batch::render_full(item);
        let choice = optimize_quality(
            |quality| {
                backend
                    .encode(&canvas, &EncodeParams { format, quality })
                    .map(|bytes| bytes.len() as u64)
            },
            target_bytes,
        )?;
        debug!(name = item.display_name(), quality = %choice.quality, "optimized quality");
        item.set_quality(choice.quality);
        self.redraw.request();
        Ok(choice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::{blank_image, editor_with_defaults, editor_with_sizes, item_targets};

    fn width(value: u32) -> Edit {
        Edit::SetDimension {
            axis: Axis::Width,
            value: Some(value),
        }
    }

    fn qualities(editor: &Editor) -> Vec<u32> {
        editor
            .queue()
            .items()
            .iter()
            .map(|i| i.quality().value())
            .collect()
    }

    // =========================================================================
    // Items and selection
    // =========================================================================

    #[test]
    fn first_item_is_selected() {
        let mut editor = Editor::new(GlobalDefaults::default());
        assert_eq!(editor.mode(), EditMode::GlobalDefaults);
        editor.add_item(blank_image(10, 10), 1, "a");
        assert_eq!(editor.mode(), EditMode::Item(0));
        editor.add_item(blank_image(10, 10), 1, "b");
        assert_eq!(editor.mode(), EditMode::Item(0));
    }

    #[test]
    fn new_items_take_current_global_defaults() {
        let mut editor = Editor::new(GlobalDefaults::default());
        editor.apply(Edit::SetQuality(Quality::new(33))).unwrap();
        editor.apply(Edit::SetFitMode(FitMode::Contain)).unwrap();
        editor.add_item(blank_image(640, 480), 1, "a");
        let item = &editor.queue().items()[0];
        assert_eq!(item.quality().value(), 33);
        assert_eq!(item.fit_mode(), FitMode::Contain);
        // Target defaults to source size, not the global 800x800
        assert_eq!(item.target(), (640, 480));
    }

    #[test]
    fn remove_item_shifts_and_deselects() {
        let mut editor = editor_with_sizes(&[(10, 10), (20, 20), (30, 30)]);
        editor.apply(Edit::Select(Some(2))).unwrap();
        editor.remove_item(0).unwrap();
        assert_eq!(editor.mode(), EditMode::Item(1));
        editor.remove_item(1).unwrap();
        assert_eq!(editor.mode(), EditMode::GlobalDefaults);
        assert!(matches!(
            editor.remove_item(7),
            Err(EditError::NoSuchItem(7))
        ));
    }

    #[test]
    fn select_out_of_range_is_error() {
        let mut editor = editor_with_sizes(&[(10, 10)]);
        assert!(matches!(
            editor.apply(Edit::Select(Some(3))),
            Err(EditError::NoSuchItem(3))
        ));
        assert_eq!(editor.mode(), EditMode::Item(0));
    }

    #[test]
    fn select_at_uses_layout_hit_test() {
        let mut editor = editor_with_sizes(&[(100, 100), (100, 100)]);
        editor.apply(Edit::SelectAt { x: 150.0, y: 50.0 }).unwrap();
        assert_eq!(editor.mode(), EditMode::Item(1));
        // Clicking the gap deselects
        editor.apply(Edit::SelectAt { x: 5.0, y: 5.0 }).unwrap();
        assert_eq!(editor.mode(), EditMode::GlobalDefaults);
    }

    // =========================================================================
    // Dimensions
    // =========================================================================

    #[test]
    fn item_mode_dimension_edits_selected_only() {
        let mut editor = editor_with_sizes(&[(1600, 900), (900, 1600)]);
        editor.apply(width(640)).unwrap();
        assert_eq!(item_targets(&editor), vec![(640, 900), (900, 1600)]);
    }

    #[test]
    fn item_mode_dimension_respects_aspect_lock() {
        let mut editor = editor_with_sizes(&[(1920, 1080)]);
        editor.apply(Edit::SetAspectLock(true)).unwrap();
        editor.apply(width(800)).unwrap();
        assert_eq!(item_targets(&editor), vec![(800, 450)]);
    }

    #[test]
    fn global_dimension_applies_to_every_item() {
        let mut editor = editor_with_sizes(&[(1600, 900), (900, 1600)]);
        editor.apply(Edit::Select(None)).unwrap();
        editor.apply(width(500)).unwrap();
        assert_eq!(item_targets(&editor), vec![(500, 900), (500, 1600)]);
        assert_eq!(editor.defaults().width, 500);
    }

    #[test]
    fn global_dimension_ignores_invalid_input() {
        let mut editor = editor_with_sizes(&[(1600, 900)]);
        editor.apply(Edit::Select(None)).unwrap();
        editor
            .apply(Edit::SetDimension {
                axis: Axis::Height,
                value: parse_dimension("abc"),
            })
            .unwrap();
        assert_eq!(item_targets(&editor), vec![(1600, 900)]);
        assert_eq!(editor.defaults().height, 800);
    }

    #[test]
    fn parse_dimension_accepts_positive_integers_only() {
        assert_eq!(parse_dimension(" 640 "), Some(640));
        assert_eq!(parse_dimension("0"), None);
        assert_eq!(parse_dimension("-5"), None);
        assert_eq!(parse_dimension("12.5"), None);
        assert_eq!(parse_dimension(""), None);
    }

    // =========================================================================
    // Quality
    // =========================================================================

    #[test]
    fn quality_goes_to_selected_item_or_global() {
        let mut editor = editor_with_sizes(&[(10, 10), (10, 10)]);
        editor.apply(Edit::SetQuality(Quality::new(50))).unwrap();
        assert_eq!(qualities(&editor), vec![50, 90]);

        editor.apply(Edit::Select(None)).unwrap();
        editor.apply(Edit::SetQuality(Quality::new(70))).unwrap();
        assert_eq!(qualities(&editor), vec![50, 90]);
        assert_eq!(editor.defaults().quality.value(), 70);
    }

    #[test]
    fn quality_scope_all_applies_everywhere() {
        let mut editor = editor_with_sizes(&[(10, 10), (10, 10), (10, 10)]);
        editor.apply(Edit::SetQuality(Quality::new(42))).unwrap();
        // Turning the scope on pushes the selected item's quality to all
        editor.apply(Edit::SetQualityScope(true)).unwrap();
        assert_eq!(qualities(&editor), vec![42, 42, 42]);

        editor.apply(Edit::Select(None)).unwrap();
        editor.apply(Edit::SetQuality(Quality::new(60))).unwrap();
        assert_eq!(qualities(&editor), vec![60, 60, 60]);
        // Global default untouched while the scope is on
        assert_eq!(editor.defaults().quality.value(), 90);
    }

    // =========================================================================
    // Focus
    // =========================================================================

    #[test]
    fn focus_drag_pans_from_start_point() {
        let mut editor = editor_with_sizes(&[(1000, 500)]);
        editor.apply(Edit::BeginFocusDrag).unwrap();
        editor.apply(Edit::DragFocus { dx: 50.0, dy: 0.0 }).unwrap();
        editor.apply(Edit::DragFocus { dx: 100.0, dy: -50.0 }).unwrap();
        editor.apply(Edit::EndFocusDrag).unwrap();

        // Deltas are relative to the drag start, not cumulative
        let focus = editor.queue().items()[0].focus();
        assert!((focus.x - 0.3).abs() < 1e-12);
        assert!((focus.y - 0.6).abs() < 1e-12);

        // After the drag ends, movement is ignored
        editor.apply(Edit::DragFocus { dx: 500.0, dy: 0.0 }).unwrap();
        assert_eq!(editor.queue().items()[0].focus(), focus);
    }

    #[test]
    fn focus_drag_does_nothing_in_contain() {
        let mut editor = editor_with_sizes(&[(1000, 500)]);
        editor.apply(Edit::SetFitMode(FitMode::Contain)).unwrap();
        editor.apply(Edit::BeginFocusDrag).unwrap();
        editor.apply(Edit::DragFocus { dx: 100.0, dy: 0.0 }).unwrap();
        assert_eq!(editor.queue().items()[0].focus(), FocalPoint::CENTER);
    }

    #[test]
    fn focus_edits_need_a_selection() {
        let mut editor = editor_with_sizes(&[(10, 10)]);
        editor.apply(Edit::Select(None)).unwrap();
        assert!(matches!(
            editor.apply(Edit::SetFocus(FocalPoint::CENTER)),
            Err(EditError::NoSelection)
        ));
        assert!(matches!(
            editor.apply(Edit::BeginFocusDrag),
            Err(EditError::NoSelection)
        ));
    }

    // =========================================================================
    // Crop
    // =========================================================================

    #[test]
    fn crop_applies_to_selected_item() {
        let mut editor = editor_with_sizes(&[(400, 300)]);
        let rect = CropRect {
            x: 0,
            y: 0,
            width: 200,
            height: 100,
        };
        editor.apply(Edit::Crop(rect)).unwrap();
        assert_eq!(editor.queue().items()[0].crop(), Some(rect));
        assert_eq!(item_targets(&editor), vec![(400, 300)]);

        editor.apply(Edit::ResetCrop).unwrap();
        assert_eq!(editor.queue().items()[0].crop(), None);
    }

    #[test]
    fn crop_outside_image_is_rejected() {
        let mut editor = editor_with_sizes(&[(400, 300)]);
        let result = editor.apply(Edit::Crop(CropRect {
            x: 500,
            y: 0,
            width: 10,
            height: 10,
        }));
        assert!(matches!(result, Err(EditError::InvalidCrop)));
    }

    // =========================================================================
    // Clear, redraw
    // =========================================================================

    #[test]
    fn clear_requires_confirmation() {
        let mut editor = editor_with_sizes(&[(10, 10)]);
        assert!(!editor.clear(|| false));
        assert_eq!(editor.queue().len(), 1);
        assert!(editor.clear(|| true));
        assert!(editor.queue().is_empty());
        assert_eq!(editor.mode(), EditMode::GlobalDefaults);
    }

    #[test]
    fn clear_empty_queue_does_not_ask() {
        let mut editor = Editor::new(GlobalDefaults::default());
        assert!(editor.clear(|| panic!("should not ask")));
    }

    #[test]
    fn clear_drops_results() {
        let mut editor = editor_with_sizes(&[(10, 10)]);
        editor.process_all(&MockBackend::new(), None, None);
        assert!(editor.results().is_some());
        editor.clear(|| true);
        assert!(editor.results().is_none());
        assert_eq!(editor.batch_state(), BatchState::Idle);
    }

    #[test]
    fn edits_coalesce_into_one_redraw() {
        let mut editor = editor_with_sizes(&[(10, 10)]);
        assert!(editor.take_redraw());
        for q in 1..=5 {
            editor.apply(Edit::SetQuality(Quality::new(q))).unwrap();
        }
        assert!(editor.take_redraw());
        assert!(!editor.take_redraw());
    }

    #[test]
    fn spacing_feeds_layout() {
        let mut editor = editor_with_sizes(&[(10, 10)]);
        editor.apply(Edit::SetSpacing(5)).unwrap();
        assert_eq!(editor.layout().bounds, (20, 20));
        // Zero is ignored
        editor.apply(Edit::SetSpacing(0)).unwrap();
        assert_eq!(editor.defaults().layout.spacing, 5);
    }

    // =========================================================================
    // Processing
    // =========================================================================

    #[test]
    fn process_all_marks_items_and_stores_results() {
        let mut editor = editor_with_sizes(&[(10, 10), (20, 10)]);
        let backend = MockBackend::failing_on_width(20);
        assert_eq!(editor.batch_state(), BatchState::Idle);
        let results = editor.process_all(&backend, None, None);
        assert_eq!(results.encoded_count(), 1);
        assert_eq!(editor.batch_state(), BatchState::Completed);
        let processed: Vec<bool> = editor
            .queue()
            .items()
            .iter()
            .map(ImageItem::is_processed)
            .collect();
        assert_eq!(processed, vec![true, false]);
    }

    #[test]
    fn rerun_replaces_results() {
        let mut editor = editor_with_sizes(&[(10, 10), (20, 10)]);
        editor.process_all(&MockBackend::new(), None, None);
        editor.remove_item(1).unwrap();
        let results = editor.process_all(&MockBackend::new(), None, None);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn process_selected_names_like_export() {
        let mut editor = editor_with_sizes(&[(10, 10), (20, 10)]);
        editor.apply(Edit::Select(Some(1))).unwrap();
        editor.apply(Edit::SetFormat(OutputFormat::Png)).unwrap();
        let file = editor.process_selected(&MockBackend::new()).unwrap();
        assert_eq!(file.name, "img2.png");
        assert_eq!(file.bytes.len(), 20);

        editor.apply(Edit::SetPrefix("set-".into())).unwrap();
        let file = editor.process_selected(&MockBackend::new()).unwrap();
        assert_eq!(file.name, "set-2.png");
        assert!(editor.queue().items()[1].is_processed());
    }

    #[test]
    fn process_selected_without_selection_is_refused() {
        let mut editor = editor_with_sizes(&[(10, 10)]);
        editor.apply(Edit::Select(None)).unwrap();
        assert!(matches!(
            editor.process_selected(&MockBackend::new()),
            Err(EditError::NoSelection)
        ));
    }

    #[test]
    fn export_without_results_is_refused() {
        let editor = editor_with_sizes(&[(10, 10)]);
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            editor.export(tmp.path()),
            Err(ExportError::NothingToExport)
        ));
    }

    #[test]
    fn export_uses_prefix() {
        let mut editor = editor_with_sizes(&[(10, 10), (20, 10)]);
        editor.apply(Edit::SetPrefix("p".into())).unwrap();
        editor.process_all(&MockBackend::new(), None, None);
        let tmp = tempfile::TempDir::new().unwrap();
        let report = editor.export(tmp.path()).unwrap();
        let files: Vec<&str> = report.files.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(files, vec!["p1.webp", "p2.webp"]);
    }

    #[test]
    fn optimize_applies_choice_to_selected_item() {
        // The mock encodes `width` bytes regardless of quality: every probe
        // fits a generous budget, so the search climbs to 100.
        let mut editor = editor_with_defaults(
            GlobalDefaults {
                format: OutputFormat::Jpeg,
                ..GlobalDefaults::default()
            },
            &[(64, 64), (64, 64)],
        );
        let backend = MockBackend::new();
        let choice = editor.optimize_selected_quality(&backend, 1000).unwrap();
        assert_eq!(choice.quality.value(), 100);
        assert_eq!(qualities(&editor), vec![100, 90]);
        assert!(backend.encodes().len() <= 7);
    }

    #[test]
    fn estimate_encodes_selected_item_in_batch_format() {
        let mut editor = editor_with_defaults(
            GlobalDefaults {
                format: OutputFormat::Jpeg,
                ..GlobalDefaults::default()
            },
            &[(64, 48), (120, 40)],
        );
        editor.apply(Edit::Select(Some(1))).unwrap();
        editor.apply(Edit::SetQuality(Quality::new(55))).unwrap();
        let backend = MockBackend::new();

        // The mock writes one byte per pixel column
        assert_eq!(editor.estimate_selected_size(&backend).unwrap(), 120);
        assert_eq!(backend.encodes(), vec![(120, 40, 55)]);
        assert!(editor.results().is_none());
        assert!(!editor.queue().items()[1].is_processed());
    }

    #[test]
    fn estimate_without_selection_fails() {
        let mut editor = editor_with_sizes(&[(64, 48)]);
        editor.apply(Edit::Select(None)).unwrap();
        let backend = MockBackend::new();
        assert!(matches!(
            editor.estimate_selected_size(&backend),
            Err(EditError::NoSelection)
        ));
        assert!(backend.encodes().is_empty());
        assert!(matches!(
            editor.estimate_item_size(&backend, 3),
            Err(EditError::NoSuchItem(3))
        ));
    }

    #[test]
    fn estimate_reports_encode_failure() {
        let mut editor = editor_with_sizes(&[(64, 48)]);
        editor.apply(Edit::Select(Some(0))).unwrap();
        let backend = MockBackend::failing_on_width(64);
        assert!(matches!(
            editor.estimate_selected_size(&backend),
            Err(EditError::Backend(_))
        ));
    }
}
