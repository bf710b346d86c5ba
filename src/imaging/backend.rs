//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four operations the variant
//! generator needs: decode, resize, encode, and identify. Encoding happens in
//! memory because filenames are derived from the encoded bytes.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, statically
//! linked, no system image libraries.

use super::params::{EncodeSettings, OutputFormat};
use image::RgbaImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image codec backends.
///
/// `Sync` because the generator calls one backend from many rayon workers.
pub trait ImageBackend: Sync {
    /// Decode a source file into 8-bit RGBA pixels.
    fn decode(&self, path: &Path) -> Result<RgbaImage, BackendError>;

    /// Resample to exactly `width` × `height`.
    fn resize(&self, image: &RgbaImage, width: u32, height: u32) -> RgbaImage;

    /// Encode pixels into `format`. Must be deterministic for identical input.
    fn encode(
        &self,
        image: &RgbaImage,
        format: OutputFormat,
        settings: &EncodeSettings,
    ) -> Result<Vec<u8>, BackendError>;

    /// Read dimensions back from an encoded buffer.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError>;
}
