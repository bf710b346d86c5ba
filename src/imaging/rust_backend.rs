//! Pure Rust codec backend. No system image libraries.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, WebP) | `image` crate decoders, normalized to RGBA8 |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e) |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |
//! | Encode → PNG | `png` crate, indexed colour; `color_quant` NeuQuant above 256 colours |
//! | Identify | `image::ImageReader::into_dimensions` on the encoded buffer |
//!
//! Every encoder here is deterministic: the same pixels and settings give
//! the same bytes, which is what makes content-hashed filenames stable.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{EncodeSettings, OutputFormat};
use color_quant::NeuQuant;
use image::codecs::avif::AvifEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder, ImageReader, RgbaImage};
use std::collections::BTreeSet;
use std::io::Cursor;
use std::path::Path;

/// Palette size limit for indexed PNG.
const MAX_PALETTE: usize = 256;

/// NeuQuant sampling factor: 1 = best quality, 30 = fastest.
const NEUQUANT_SAMPLE_FACTOR: i32 = 10;

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

fn encode_avif(image: &RgbaImage, settings: &EncodeSettings) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let encoder = AvifEncoder::new_with_speed_quality(
        &mut buf,
        settings.avif_speed,
        settings.avif_quality.value() as u8,
    );
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| BackendError::ProcessingFailed(format!("AVIF encode failed: {}", e)))?;
    Ok(buf)
}

fn encode_webp(image: &RgbaImage) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    WebPEncoder::new_lossless(&mut buf)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {}", e)))?;
    Ok(buf)
}

/// Colour table plus one palette index per pixel.
struct Indexed {
    palette: Vec<[u8; 4]>,
    indices: Vec<u8>,
}

/// Exact palette when the image has at most 256 distinct colours.
fn exact_palette(image: &RgbaImage) -> Option<Indexed> {
    let mut colors = BTreeSet::new();
    for pixel in image.pixels() {
        colors.insert(pixel.0);
        if colors.len() > MAX_PALETTE {
            return None;
        }
    }
    let palette: Vec<[u8; 4]> = colors.into_iter().collect();
    let indices = image
        .pixels()
        .map(|p| palette.binary_search(&p.0).unwrap_or_default() as u8)
        .collect();
    Some(Indexed { palette, indices })
}

/// 256-colour NeuQuant quantization for everything else.
fn quantized_palette(image: &RgbaImage) -> Indexed {
    let quant = NeuQuant::new(NEUQUANT_SAMPLE_FACTOR, MAX_PALETTE, image.as_raw());
    let palette = quant
        .color_map_rgba()
        .chunks_exact(4)
        .map(|c| [c[0], c[1], c[2], c[3]])
        .collect();
    let indices = image
        .pixels()
        .map(|p| quant.index_of(&p.0) as u8)
        .collect();
    Indexed { palette, indices }
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, BackendError> {
    let Indexed { palette, indices } =
        exact_palette(image).unwrap_or_else(|| quantized_palette(image));

    let rgb: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    let alpha: Vec<u8> = palette.iter().map(|c| c[3]).collect();

    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buf, image.width(), image.height());
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Best);
        encoder.set_palette(rgb);
        if alpha.iter().any(|&a| a != u8::MAX) {
            encoder.set_trns(alpha);
        }
        let mut writer = encoder
            .write_header()
            .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {}", e)))?;
        writer
            .write_image_data(&indices)
            .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {}", e)))?;
        writer
            .finish()
            .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {}", e)))?;
    }
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<RgbaImage, BackendError> {
        let img = ImageReader::open(path)
            .map_err(BackendError::Io)?
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .decode()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!(
                    "Failed to decode {}: {}",
                    path.display(),
                    e
                ))
            })?;
        Ok(img.to_rgba8())
    }

    fn resize(&self, image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
        image::imageops::resize(image, width, height, FilterType::Lanczos3)
    }

    fn encode(
        &self,
        image: &RgbaImage,
        format: OutputFormat,
        settings: &EncodeSettings,
    ) -> Result<Vec<u8>, BackendError> {
        match format {
            OutputFormat::Avif => encode_avif(image, settings),
            OutputFormat::WebP => encode_webp(image),
            OutputFormat::Png => encode_png(image),
        }
    }

    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .into_dimensions()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
            })?;
        Ok(Dimensions { width, height })
    }
}
