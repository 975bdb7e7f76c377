//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers the three host operations the rest of
//! the crate needs: identify a file, decode it to a bitmap, and encode a
//! bitmap to bytes at a quality level. Geometry and composition never go
//! through the backend, so everything above it is testable with a mock.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust on the
//! `image` crate.

use super::params::EncodeParams;
use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    DecodeFailed(String),
    #[error("Encode failed: {0}")]
    EncodeFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` so loading can fan out across rayon's pool.
pub trait ImageBackend: Sync {
    /// Get image dimensions without a full decode.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode a file into a full-resolution bitmap.
    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError>;

    /// Encode a composed bitmap to bytes.
    fn encode(
        &self,
        image: &DynamicImage,
        params: &EncodeParams,
    ) -> Result<Vec<u8>, BackendError>;
}
