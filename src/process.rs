//! Responsive image variant generation.
//!
//! Stage 1 of the build pipeline. For every image listed in the `[images]`
//! config table, generates AVIF, WebP and palette-PNG variants at the
//! configured size(s), names each file by a hash of its encoded bytes, and
//! returns a [`Manifest`] describing everything that was written.
//!
//! ## Resize Specs
//!
//! ```text
//! { width = 320 }               one size, height follows aspect ratio
//! { height = 176 }              one size, width follows aspect ratio
//! { widths = [400, 800, 1200] } one variant set per width, ascending;
//!                               the largest is the fallback
//! ```
//!
//! ## Output Structure
//!
//! ```text
//! dist/assets/images/
//! ├── column_1.400x300.3f9a0c1b2d.avif    # multi-width: size tag in the name
//! ├── column_1.400x300.7e11d0a4c9.webp
//! ├── column_1.400x300.b04c2e9f18.png
//! ├── …                                    # 800w, 1200w
//! ├── seeds_left_top.5d2c7b8a90.avif       # single size: no size tag
//! └── …
//! ```
//!
//! ## Parallel Processing
//!
//! Images, sizes of one image, and the three encodes of one size all run
//! concurrently on the [rayon](https://docs.rs/rayon) pool. Nothing is
//! ordered between images; the result is collected into an ordered map.
//!
//! Files in the source directory that have no config entry are ignored.
//! A configured file that is missing or undecodable fails the whole stage.

use crate::config::ResizeSpec;
use crate::imaging::{
    BackendError, EncodeSettings, EncodedSizes, GeneratedVariant, ImageBackend, ResizeTarget,
    RustBackend, create_variant,
};
use crate::manifest::{Manifest, SrcsetEntry, VariantEntry};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed for {filename}: {source}")]
    Imaging {
        filename: String,
        source: BackendError,
    },
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("No sizes configured for {0}")]
    NoVariants(String),
}

/// Inputs of the image stage.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// Resize table: source filename → spec.
    pub images: BTreeMap<String, ResizeSpec>,
    pub encode: EncodeSettings,
    /// CSS sizes attribute for multi-width images without their own.
    pub default_sizes: String,
}

impl ProcessConfig {
    pub fn from_pipeline_config(config: &crate::config::PipelineConfig) -> Self {
        Self {
            images: config.images.clone(),
            encode: EncodeSettings::from_config(&config.encoding),
            default_sizes: config.responsive.sizes.clone(),
        }
    }
}

/// Progress events sent while images are processed.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    Started {
        image_count: usize,
    },
    ImageProcessed {
        filename: String,
        source_bytes: u64,
        /// Generated at several widths (srcset) rather than one size.
        multi_width: bool,
        variants: Vec<VariantInfo>,
    },
}

/// One generated size of an image.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantInfo {
    pub width: u32,
    pub height: u32,
    pub sizes: EncodedSizes,
}

/// Output of the image stage.
#[derive(Debug)]
pub struct ProcessResult {
    pub manifest: Manifest,
}

pub fn process(
    source_dir: &Path,
    output_dir: &Path,
    config: &ProcessConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    let backend = RustBackend::new();
    process_with_backend(&backend, source_dir, output_dir, config, progress)
}

/// Process images using a specific backend (allows testing with mock).
pub fn process_with_backend(
    backend: &impl ImageBackend,
    source_dir: &Path,
    output_dir: &Path,
    config: &ProcessConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    std::fs::create_dir_all(output_dir)?;

    if let Some(tx) = &progress {
        tx.send(ProcessEvent::Started {
            image_count: config.images.len(),
        })
        .ok();
    }

    let entries = config
        .images
        .par_iter()
        .map(|(filename, spec)| {
            let (entry, event) =
                process_image(backend, source_dir, output_dir, filename, spec, config)?;
            if let Some(tx) = &progress {
                tx.send(event).ok();
            }
            Ok((filename.clone(), entry))
        })
        .collect::<Result<BTreeMap<_, _>, ProcessError>>()?;

    Ok(ProcessResult {
        manifest: Manifest {
            vectors: None,
            images: entries,
        },
    })
}

/// Generate every variant of one source image.
fn process_image(
    backend: &impl ImageBackend,
    source_dir: &Path,
    output_dir: &Path,
    filename: &str,
    spec: &ResizeSpec,
    config: &ProcessConfig,
) -> Result<(VariantEntry, ProcessEvent), ProcessError> {
    let source_path = source_dir.join(filename);
    if !source_path.is_file() {
        return Err(ProcessError::SourceNotFound(source_path));
    }
    let source_bytes = std::fs::metadata(&source_path)?.len();

    let imaging_err = |source: BackendError| ProcessError::Imaging {
        filename: filename.to_string(),
        source,
    };

    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());

    let source = backend.decode(&source_path).map_err(imaging_err)?;

    let targets = match spec {
        ResizeSpec::Width { width } => vec![ResizeTarget::Width(*width)],
        ResizeSpec::Height { height } => vec![ResizeTarget::Height(*height)],
        ResizeSpec::Widths { widths, .. } => ResizeSpec::sorted_widths(widths)
            .into_iter()
            .map(ResizeTarget::Width)
            .collect(),
    };
    let multi = matches!(spec, ResizeSpec::Widths { .. });

    // `collect` on an indexed parallel iterator keeps input order.
    let variants: Vec<GeneratedVariant> = targets
        .par_iter()
        .map(|target| {
            create_variant(
                backend,
                &source,
                *target,
                &config.encode,
                output_dir,
                &stem,
                multi,
            )
        })
        .collect::<Result<Vec<_>, BackendError>>()
        .map_err(imaging_err)?;

    let event = ProcessEvent::ImageProcessed {
        filename: filename.to_string(),
        source_bytes,
        multi_width: multi,
        variants: variants
            .iter()
            .map(|v| VariantInfo {
                width: v.width,
                height: v.height,
                sizes: v.sizes,
            })
            .collect(),
    };

    let entry = build_entry(spec, &variants, &config.default_sizes)
        .ok_or_else(|| ProcessError::NoVariants(filename.to_string()))?;
    Ok((entry, event))
}

/// Summarize generated variants (ascending width) as a manifest entry.
///
/// `None` only when no variant was generated at all.
fn build_entry(
    spec: &ResizeSpec,
    variants: &[GeneratedVariant],
    default_sizes: &str,
) -> Option<VariantEntry> {
    let fallback = variants.last()?;
    let (srcset, sizes) = match spec {
        ResizeSpec::Widths { sizes, .. } => (
            Some(
                variants
                    .iter()
                    .map(|v| SrcsetEntry {
                        files: v.files.clone(),
                        width: v.width,
                    })
                    .collect(),
            ),
            Some(sizes.clone().unwrap_or_else(|| default_sizes.to_string())),
        ),
        ResizeSpec::Width { .. } | ResizeSpec::Height { .. } => (None, None),
    };
    Some(VariantEntry {
        fallback: fallback.files.clone(),
        width: fallback.width,
        height: fallback.height,
        srcset,
        sizes,
    })
}
