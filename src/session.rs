//! Build an editing session from config and loaded images.
//!
//! The CLI has no interactive panel, so everything a user would click is
//! replayed as [`Edit`]s against a fresh [`Editor`]:
//!
//! 1. Every image is queued with the config's global defaults.
//! 2. `[resize] width/height`, when set, go through the global-mode
//!    dimension edit, exactly like typing into the batch size fields.
//! 3. Each `[[items]]` override selects its item and applies fit, aspect
//!    lock, crop, size, quality and focus in that order. Crop comes before
//!    size so a locked aspect is computed from the cropped region.
//! 4. The quality scope is switched on last if configured, so "apply to all"
//!    wins over per-item quality.
//!
//! The session ends in global mode with nothing selected.

use crate::config::BatchConfig;
use crate::editor::{Edit, EditError, Editor, GlobalDefaults};
use crate::imaging::{Axis, ImageBackend, Quality};
use crate::load::LoadedImage;
use crate::optimize::QualityChoice;
use tracing::{debug, warn};

/// Queue `loaded` and apply the config's sizes and per-item overrides.
pub fn build_editor(config: &BatchConfig, loaded: Vec<LoadedImage>) -> Result<Editor, EditError> {
    let mut editor = Editor::new(GlobalDefaults {
        quality_all: false,
        ..config.global_defaults()
    });

    let mut file_names = Vec::with_capacity(loaded.len());
    for image in loaded {
        editor.add_item(image.image, image.file_size, image.display_name);
        file_names.push(image.file_name);
    }

    editor.apply(Edit::Select(None))?;
    for (axis, value) in [
        (Axis::Width, config.resize.width),
        (Axis::Height, config.resize.height),
    ] {
        if value.is_some() {
            editor.apply(Edit::SetDimension { axis, value })?;
        }
    }

    for (index, file_name) in file_names.iter().enumerate() {
        let Some(ov) = config.item_override(file_name) else {
            continue;
        };
        debug!(file = %file_name, "applying item override");
        editor.apply(Edit::Select(Some(index)))?;
        if let Some(fit) = ov.fit {
            editor.apply(Edit::SetFitMode(fit))?;
        }
        if let Some(lock) = ov.aspect_lock {
            editor.apply(Edit::SetAspectLock(lock))?;
        }
        if let Some(crop) = ov.crop {
            editor.apply(Edit::Crop(crop))?;
        }
        if let Some(width) = ov.width {
            editor.apply(Edit::SetDimension {
                axis: Axis::Width,
                value: Some(width),
            })?;
        }
        if let Some(height) = ov.height {
            editor.apply(Edit::SetDimension {
                axis: Axis::Height,
                value: Some(height),
            })?;
        }
        if let Some(q) = ov.quality {
            editor.apply(Edit::SetQuality(Quality::new(q)))?;
        }
        if let Some(focus) = ov.focus {
            editor.apply(Edit::SetFocus(focus))?;
        }
    }

    for ov in &config.items {
        if !file_names.contains(&ov.file) {
            warn!(file = %ov.file, "item override matches no input");
        }
    }

    editor.apply(Edit::Select(None))?;
    if config.output.quality_all {
        editor.apply(Edit::SetQualityScope(true))?;
    }
    Ok(editor)
}

/// Run the quality optimizer on every item, in queue order.
///
/// Leaves the selection as it found it.
pub fn optimize_all(
    editor: &mut Editor,
    backend: &impl ImageBackend,
    target_bytes: u64,
) -> Result<Vec<QualityChoice>, EditError> {
    let previous = editor.queue().selected();
    let mut choices = Vec::with_capacity(editor.queue().len());
    for index in 0..editor.queue().len() {
        editor.apply(Edit::Select(Some(index)))?;
        choices.push(editor.optimize_selected_quality(backend, target_bytes)?);
    }
    editor.apply(Edit::Select(previous))?;
    Ok(choices)
}
