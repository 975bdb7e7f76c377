//! Pure Rust image backend on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` (pure Rust decoders) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the requested quality |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (lossless) |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless only) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{EncodeParams, OutputFormat};
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
///
/// AVIF is not listed: the `image` crate's `"avif"` feature only enables the
/// encoder, and `ImageFormat::reading_enabled()` reports it anyway.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has an extension we can decode (case-insensitive).
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_to_vec(image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let quality = params.quality.value() as u8;
    let result = match params.format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha: transparent letterbox bars come out black
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
        }
        OutputFormat::Png => image.write_with_encoder(PngEncoder::new(&mut buf)),
        OutputFormat::Webp => {
            let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
            rgba.write_with_encoder(WebPEncoder::new_lossless(&mut buf))
        }
        OutputFormat::Avif => {
            let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
            rgba.write_with_encoder(AvifEncoder::new_with_speed_quality(&mut buf, 6, quality))
        }
    };
    result.map_err(|e| {
        BackendError::EncodeFailed(format!("{} encode failed: {}", params.format, e))
    })?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::DecodeFailed(format!(
                "Failed to read dimensions of {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        ImageReader::open(path)
            .map_err(BackendError::Io)?
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .decode()
            .map_err(|e| {
                BackendError::DecodeFailed(format!("Failed to decode {}: {}", path.display(), e))
            })
    }

    fn encode(
        &self,
        image: &DynamicImage,
        params: &EncodeParams,
    ) -> Result<Vec<u8>, BackendError> {
        encode_to_vec(image, params)
    }
}
