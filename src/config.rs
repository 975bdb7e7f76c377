//! Batch configuration module.
//!
//! Handles loading, validating, and merging `batchfit.toml`. Stock defaults
//! are serialized to a TOML value and the user file is merged over them, so
//! a user file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! format = "webp"       # webp, jpeg, png or avif
//! prefix = ""           # non-blank: export as {prefix}1.webp, {prefix}2.webp, ...
//! quality = 90          # 1-100, for lossy formats
//! quality_all = false   # apply quality edits to every image
//! auto_quality = false  # search a quality per image that fits target_kb
//! target_kb = 200
//!
//! [resize]
//! # width = 1200        # batch-wide target size; omit to keep source sizes
//! # height = 800
//! fit = "cover"         # cover (crop to fill) or contain (letterbox)
//! aspect_lock = false   # derive the other axis from the image aspect
//! drag_sensitivity = 0.002
//!
//! [layout]
//! spacing = 20
//! max_canvas = 16384
//! thumbnail_cap = 200
//! thumbnail_threshold = 12
//! preview_cap = 400
//!
//! [processing]
//! max_processes = 4     # decode workers (omit for auto = CPU cores)
//!
//! [[items]]             # per-file overrides, matched by file name
//! file = "IMG_0042.jpg"
//! width = 600
//! focus = { x = 0.3, y = 0.5 }
//! crop = { x = 0, y = 0, width = 2000, height = 1500 }
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::editor::GlobalDefaults;
use crate::imaging::{CropRect, FitMode, FocalPoint, OutputFormat, Quality};
use crate::layout::LayoutSettings;
use crate::optimize::DEFAULT_TARGET_KB;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "batchfit.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Batch configuration loaded from `batchfit.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Export format, naming and quality.
    pub output: OutputConfig,
    /// Target sizes and fit behaviour.
    pub resize: ResizeConfig,
    /// Contact sheet layout.
    pub layout: LayoutConfig,
    /// Parallel decode settings.
    pub processing: ProcessingConfig,
    /// Per-file overrides.
    pub items: Vec<ItemOverride>,
}

impl BatchConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_quality(self.output.quality, "output.quality")?;
        if self.output.target_kb == 0 {
            return Err(ConfigError::Validation(
                "output.target_kb must be positive".into(),
            ));
        }
        check_dimension(self.resize.width, "resize.width")?;
        check_dimension(self.resize.height, "resize.height")?;
        if !(self.resize.drag_sensitivity.is_finite() && self.resize.drag_sensitivity > 0.0) {
            return Err(ConfigError::Validation(
                "resize.drag_sensitivity must be a positive number".into(),
            ));
        }
        let layout = &self.layout;
        for (value, key) in [
            (layout.spacing, "layout.spacing"),
            (layout.max_canvas, "layout.max_canvas"),
            (layout.thumbnail_cap, "layout.thumbnail_cap"),
            (layout.preview_cap, "layout.preview_cap"),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation(format!("{key} must be positive")));
            }
        }
        for item in &self.items {
            item.validate()?;
        }
        Ok(())
    }

    /// Editor defaults described by this config.
    pub fn global_defaults(&self) -> GlobalDefaults {
        let stock = GlobalDefaults::default();
        GlobalDefaults {
            quality: Quality::new(self.output.quality),
            fit_mode: self.resize.fit,
            aspect_lock: self.resize.aspect_lock,
            width: self.resize.width.unwrap_or(stock.width),
            height: self.resize.height.unwrap_or(stock.height),
            format: self.output.format,
            prefix: self.output.prefix.clone(),
            quality_all: self.output.quality_all,
            drag_sensitivity: self.resize.drag_sensitivity,
            layout: self.layout.settings(),
            preview_cap: self.layout.preview_cap,
        }
    }

    /// Override for the file named `file_name`, if any. Later entries win.
    pub fn item_override(&self, file_name: &str) -> Option<&ItemOverride> {
        self.items.iter().rev().find(|o| o.file == file_name)
    }
}

fn check_quality(quality: u32, key: &str) -> Result<(), ConfigError> {
    if !(Quality::MIN.value()..=Quality::MAX.value()).contains(&quality) {
        return Err(ConfigError::Validation(format!("{key} must be 1-100")));
    }
    Ok(())
}

fn check_dimension(value: Option<u32>, key: &str) -> Result<(), ConfigError> {
    if value == Some(0) {
        return Err(ConfigError::Validation(format!("{key} must be positive")));
    }
    Ok(())
}

/// Export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Batch-wide rename prefix. Blank keeps display names.
    pub prefix: String,
    pub quality: u32,
    pub quality_all: bool,
    /// Pick each item's quality with the optimizer before encoding.
    pub auto_quality: bool,
    /// Size budget for `auto_quality`, in KB.
    pub target_kb: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            prefix: String::new(),
            quality: Quality::default().value(),
            quality_all: false,
            auto_quality: false,
            target_kb: DEFAULT_TARGET_KB,
        }
    }
}

/// Target size and fit settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    /// When set, every item's target width is set to this.
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: FitMode,
    pub aspect_lock: bool,
    /// Focal point change per dragged pixel.
    pub drag_sensitivity: f64,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            fit: FitMode::default(),
            aspect_lock: false,
            drag_sensitivity: 0.002,
        }
    }
}

/// Contact sheet layout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub spacing: u32,
    /// Largest sheet edge before everything is scaled down.
    pub max_canvas: u32,
    /// Long-edge cap for grid cells once the queue is past the threshold.
    pub thumbnail_cap: u32,
    pub thumbnail_threshold: usize,
    /// Long-edge cap of the per-item preview bitmap.
    pub preview_cap: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let settings = LayoutSettings::default();
        Self {
            spacing: settings.spacing,
            max_canvas: settings.max_canvas,
            thumbnail_cap: settings.thumbnail_cap,
            thumbnail_threshold: settings.thumbnail_threshold,
            preview_cap: 400,
        }
    }
}

impl LayoutConfig {
    pub fn settings(&self) -> LayoutSettings {
        LayoutSettings {
            spacing: self.spacing,
            max_canvas: self.max_canvas,
            thumbnail_cap: self.thumbnail_cap,
            thumbnail_threshold: self.thumbnail_threshold,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel decode workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Settings for one input file, applied after the global ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemOverride {
    /// File name (not path) of the input this applies to.
    pub file: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u32>,
    pub fit: Option<FitMode>,
    pub aspect_lock: Option<bool>,
    pub focus: Option<FocalPoint>,
    pub crop: Option<CropRect>,
}

impl ItemOverride {
    fn validate(&self) -> Result<(), ConfigError> {
        let key = |field: &str| format!("items[{}].{field}", self.file);
        check_dimension(self.width, &key("width"))?;
        check_dimension(self.height, &key("height"))?;
        if let Some(q) = self.quality {
            check_quality(q, &key("quality"))?;
        }
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if self.focus.is_some_and(|f| !(in_unit(f.x) && in_unit(f.y))) {
            return Err(ConfigError::Validation(format!(
                "{} must lie within 0-1",
                key("focus")
            )));
        }
        if self.crop.is_some_and(|c| c.width == 0 || c.height == 0) {
            return Err(ConfigError::Validation(format!(
                "{} must not be empty",
                key("crop")
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Serialize stock defaults to a TOML value for merging.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(BatchConfig::default())?)
}

/// Deep-merge two TOML values. Overlay keys win; tables merge recursively.
/// Arrays (like `[[items]]`) are replaced wholesale.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value. `None` if it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge `overlay` over `base`, deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BatchConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BatchConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config.
///
/// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in the
/// working directory is used if present, else the stock defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<BatchConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(
            load_raw_config(path)?.ok_or_else(|| ConfigError::NotFound(path.to_path_buf()))?,
        ),
        None => load_raw_config(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    resolve_config(stock_defaults_value()?, overlay)
}

/// A documented stock `batchfit.toml` with all keys and their defaults.
pub fn stock_config_toml() -> &'static str {
    r##"# batchfit configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Export format: "webp", "jpeg", "png" or "avif".
format = "webp"

# Batch rename. When non-blank, files are exported as {prefix}1.webp,
# {prefix}2.webp, ... in queue order. Blank keeps each file's own name.
prefix = ""

# Encoding quality for lossy formats (1 = smallest, 100 = best).
quality = 90

# Apply quality edits to every image instead of only the selected one.
quality_all = false

# Search a quality per image whose encoded size lands near target_kb.
auto_quality = false
target_kb = 200

# ---------------------------------------------------------------------------
# Resize
# ---------------------------------------------------------------------------
[resize]
# Batch-wide target size. Omit to keep each image's source size.
# width = 1200
# height = 800

# "cover" crops to fill the target around the focal point.
# "contain" fits the whole image and leaves transparent bars.
fit = "cover"

# Derive the other axis from the image's aspect ratio when one is set.
aspect_lock = false

# Focal point change per pixel of drag.
drag_sensitivity = 0.002

# ---------------------------------------------------------------------------
# Contact sheet layout
# ---------------------------------------------------------------------------
[layout]
# Gap between images and around the sheet edge, in pixels.
spacing = 20

# Sheets larger than this on either edge are scaled down to fit.
max_canvas = 16384

# Past thumbnail_threshold images, grid cells shrink to thumbnail_cap.
thumbnail_cap = 200
thumbnail_threshold = 12

# Long edge of the low-resolution copy used for previews.
preview_cap = 400

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel decode workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Per-image overrides
# ---------------------------------------------------------------------------
# Matched by file name. Any key left out keeps the global setting.
#
# [[items]]
# file = "IMG_0042.jpg"
# width = 600
# height = 600
# quality = 75
# fit = "contain"
# aspect_lock = true
# focus = { x = 0.3, y = 0.5 }
# crop = { x = 0, y = 0, width = 2000, height = 1500 }
"##
}
