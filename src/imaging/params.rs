//! Parameter types for image operations.
//!
//! These types describe *what* to produce, not *how*. They are shared by the
//! geometry functions in [`calculations`](super::calculations), the raster
//! work in [`operations`](super::operations) and the encoders behind the
//! [`backend`](super::backend) trait.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`OutputFormat`]: The single, batch-wide output format.
//! - [`FitMode`]: Contain (letterbox) or Cover (fill + crop by focal point).
//! - [`FocalPoint`]: Normalized point kept visible when Cover crops. Clamped on construction.
//! - [`CropRect`]: Manual crop region in source pixel coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(pub u32);

impl Quality {
    pub const MIN: Quality = Quality(1);
    pub const MAX: Quality = Quality(100);

    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Output encoding, shared by every item in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Webp,
    Jpeg,
    Png,
    Avif,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Webp,
        OutputFormat::Jpeg,
        OutputFormat::Png,
        OutputFormat::Avif,
    ];

    /// File extension used on export (the MIME subtype).
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Webp => "webp",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Avif => "avif",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Webp => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Avif => "image/avif",
        }
    }

    /// Whether the encoder honours [`Quality`]. The `image` crate only
    /// ships a lossless WebP encoder, so WebP and PNG ignore it.
    pub fn is_lossy(self) -> bool {
        matches!(self, OutputFormat::Jpeg | OutputFormat::Avif)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "webp" => Ok(OutputFormat::Webp),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "avif" => Ok(OutputFormat::Avif),
            other => Err(format!(
                "unknown format '{other}' (expected webp, jpeg, png or avif)"
            )),
        }
    }
}

/// How a source is placed into its target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Scale the whole source inside the box and center it (letterbox).
    Contain,
    /// Fill the box and crop the overflowing axis, positioned by the focal point.
    #[default]
    Cover,
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitMode::Contain => f.write_str("contain"),
            FitMode::Cover => f.write_str("cover"),
        }
    }
}

impl FromStr for FitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contain" => Ok(FitMode::Contain),
            "cover" => Ok(FitMode::Cover),
            other => Err(format!(
                "unknown fit mode '{other}' (expected contain or cover)"
            )),
        }
    }
}

/// Normalized (0–1) point that Cover keeps in view. `(0.5, 0.5)` centers
/// the crop, `0` aligns to the left/top edge and `1` to the right/bottom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocalPoint {
    pub x: f64,
    pub y: f64,
}

impl FocalPoint {
    pub const CENTER: FocalPoint = FocalPoint { x: 0.5, y: 0.5 };

    /// Build a focal point, clamping both coordinates into `[0, 1]`.
    /// NaN collapses to the center.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp01(x),
            y: clamp01(y),
        }
    }
}

impl Default for FocalPoint {
    fn default() -> Self {
        Self::CENTER
    }
}

impl FromStr for FocalPoint {
    type Err = String;

    /// Parses `"x,y"`, e.g. `"0.5,0.2"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("focus '{s}' must be written as x,y"))?;
        let x: f64 = x.trim().parse().map_err(|_| format!("bad focus x in '{s}'"))?;
        let y: f64 = y.trim().parse().map_err(|_| format!("bad focus y in '{s}'"))?;
        Ok(FocalPoint::new(x, y))
    }
}

pub(crate) fn clamp01(v: f64) -> f64 {
    if v.is_nan() { 0.5 } else { v.clamp(0.0, 1.0) }
}

/// A crop region in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Clip this rect to a `width`×`height` image. Returns `None` when
    /// nothing of the rect remains inside the image.
    pub fn clamp_to(self, width: u32, height: u32) -> Option<CropRect> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let w = self.width.min(width - self.x);
        let h = self.height.min(height - self.y);
        if w == 0 || h == 0 {
            return None;
        }
        Some(CropRect {
            x: self.x,
            y: self.y,
            width: w,
            height: h,
        })
    }

    /// Map this rect from a `from`-sized image onto a `to`-sized rendition
    /// of the same picture (used to crop previews).
    pub fn rescale(self, from: (u32, u32), to: (u32, u32)) -> CropRect {
        let sx = to.0 as f64 / from.0 as f64;
        let sy = to.1 as f64 / from.1 as f64;
        let x = ((self.x as f64 * sx).round() as u32).min(to.0.saturating_sub(1));
        let y = ((self.y as f64 * sy).round() as u32).min(to.1.saturating_sub(1));
        let width = ((self.width as f64 * sx).round() as u32).clamp(1, to.0 - x);
        let height = ((self.height as f64 * sy).round() as u32).clamp(1, to.1 - y);
        CropRect {
            x,
            y,
            width,
            height,
        }
    }
}

impl FromStr for CropRect {
    type Err = String;

    /// Parses `"x,y,width,height"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<u32> = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<_, _>>()
            .map_err(|_| format!("crop '{s}' must be x,y,width,height"))?;
        match parts.as_slice() {
            [x, y, width, height] => Ok(CropRect {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
            }),
            _ => Err(format!("crop '{s}' must be x,y,width,height")),
        }
    }
}

/// Everything an encoder needs besides the pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeParams {
    pub format: OutputFormat,
    pub quality: Quality,
}
