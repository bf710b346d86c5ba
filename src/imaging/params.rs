//! Parameter types for image operations.
//!
//! These describe *what* to produce, not *how*. They sit between the
//! high-level [`operations`](super::operations) module and the
//! [`backend`](super::backend) that does the pixel work, so a mock backend
//! can stand in during tests without touching operation logic.
//!
//! - [`Quality`]: lossy encoding quality (1–100). Clamped on construction.
//! - [`OutputFormat`]: the three formats every variant is written in.
//! - [`EncodeSettings`]: encoder knobs shared by every variant of a build.
//! - [`ResizeTarget`]: the single constrained axis of one resize.

use crate::config::EncodingConfig;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(65)
    }
}

/// Output formats, in the order they appear in `<picture>` markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Modern compressed format, first `<source>`.
    Avif,
    /// Widely-supported compressed format, second `<source>`.
    WebP,
    /// Lossless palette fallback, used by the `<img>` itself.
    Png,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Avif, OutputFormat::WebP, OutputFormat::Png];

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Avif => "avif",
            OutputFormat::WebP => "webp",
            OutputFormat::Png => "png",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Avif => "image/avif",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Png => "image/png",
        }
    }
}

/// Encoder settings shared by every variant of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    pub avif_quality: Quality,
    /// rav1e speed preset, 1 (slowest) to 10 (fastest).
    pub avif_speed: u8,
}

impl EncodeSettings {
    pub fn from_config(config: &EncodingConfig) -> Self {
        Self {
            avif_quality: Quality::new(config.avif_quality),
            avif_speed: config.avif_speed.clamp(1, 10),
        }
    }
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self::from_config(&EncodingConfig::default())
    }
}

/// The constrained axis of a resize; the other axis follows the aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeTarget {
    Width(u32),
    Height(u32),
}
