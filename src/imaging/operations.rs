//! High-level image operations.
//!
//! These functions combine calculations with backend execution: resize one
//! decoded source to one target size, encode all three formats concurrently,
//! read the final dimensions back, and write content-hashed files.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{size_tag, target_dimensions};
use super::params::{EncodeSettings, OutputFormat, ResizeTarget};
use crate::hashing::{content_hash, hashed_filename};
use crate::manifest::FormatSet;
use image::RgbaImage;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// The three encoded buffers of one variant, plus the dimensions read back
/// from the lossless buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedVariant {
    pub avif: Vec<u8>,
    pub webp: Vec<u8>,
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Byte sizes of the encoded buffers, for progress output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodedSizes {
    pub avif: u64,
    pub webp: u64,
    pub png: u64,
}

/// A variant written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVariant {
    pub files: FormatSet,
    pub width: u32,
    pub height: u32,
    pub sizes: EncodedSizes,
}

/// Resize `source` to `target` and encode it in every output format.
///
/// The three encodes run concurrently. Dimensions are identified from the
/// PNG buffer once it exists, never computed ahead of time.
pub fn encode_variant(
    backend: &impl ImageBackend,
    source: &RgbaImage,
    target: ResizeTarget,
    settings: &EncodeSettings,
) -> Result<EncodedVariant> {
    let (width, height) = target_dimensions((source.width(), source.height()), target);
    let resized = backend.resize(source, width, height);

    let (avif, (webp, png)) = rayon::join(
        || backend.encode(&resized, OutputFormat::Avif, settings),
        || {
            rayon::join(
                || backend.encode(&resized, OutputFormat::WebP, settings),
                || backend.encode(&resized, OutputFormat::Png, settings),
            )
        },
    );
    let (avif, webp, png) = (avif?, webp?, png?);

    let dims = backend.identify(&png)?;
    Ok(EncodedVariant {
        avif,
        webp,
        png,
        width: dims.width,
        height: dims.height,
    })
}

/// Write an encoded variant under content-hashed names.
///
/// Names are `<stem>.<WxH>.<hash>.<ext>` when `tag_size` is set (images
/// generated at several widths), otherwise `<stem>.<hash>.<ext>`.
pub fn write_variant(
    encoded: &EncodedVariant,
    output_dir: &Path,
    stem: &str,
    tag_size: bool,
) -> Result<GeneratedVariant> {
    let tag = tag_size.then(|| size_tag(encoded.width, encoded.height));
    let name_for = |bytes: &[u8], format: OutputFormat| {
        hashed_filename(stem, tag.as_deref(), &content_hash(bytes), format.extension())
    };

    let files = FormatSet {
        avif: name_for(&encoded.avif, OutputFormat::Avif),
        webp: name_for(&encoded.webp, OutputFormat::WebP),
        png: name_for(&encoded.png, OutputFormat::Png),
    };

    std::fs::write(output_dir.join(&files.avif), &encoded.avif)?;
    std::fs::write(output_dir.join(&files.webp), &encoded.webp)?;
    std::fs::write(output_dir.join(&files.png), &encoded.png)?;

    Ok(GeneratedVariant {
        files,
        width: encoded.width,
        height: encoded.height,
        sizes: EncodedSizes {
            avif: encoded.avif.len() as u64,
            webp: encoded.webp.len() as u64,
            png: encoded.png.len() as u64,
        },
    })
}

/// Encode and write one variant.
pub fn create_variant(
    backend: &impl ImageBackend,
    source: &RgbaImage,
    target: ResizeTarget,
    settings: &EncodeSettings,
    output_dir: &Path,
    stem: &str,
    tag_size: bool,
) -> Result<GeneratedVariant> {
    let encoded = encode_variant(backend, source, target, settings)?;
    write_variant(&encoded, output_dir, stem, tag_size)
}
