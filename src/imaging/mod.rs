//! Image processing in pure Rust on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Decode** | `image::ImageReader` with format sniffing |
//! | **Preview** | `resize_exact` (Triangle) capped at the preview edge |
//! | **Fit render** | [`fit_rect`] + `resize_exact` + `imageops::overlay` |
//! | **Encode** | JPEG / PNG / WebP (lossless) / AVIF encoders |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for fit geometry and dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Raster functions combining calculations with pixel buffers

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    Axis, DrawRect, PixelRect, fit_rect, locked_counterpart, preview_dimensions, thumbnail_box,
};
pub use operations::{cropped, make_preview, render_fit};
pub(crate) use params::clamp01;
pub use params::{CropRect, EncodeParams, FitMode, FocalPoint, OutputFormat, Quality};
pub use rust_backend::{RustBackend, is_supported_input, supported_input_extensions};
