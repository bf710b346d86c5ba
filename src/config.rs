//! Build configuration.
//!
//! Handles loading, validating, and layering `asset-press.toml`. User values
//! are merged on top of stock defaults, so a config file only needs the keys
//! it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! images = "assets/images"   # Source rasters and SVGs
//! css = "assets/css"         # Copied verbatim
//! fonts = "assets/fonts"     # Copied verbatim
//! template = "index.html"    # HTML template to rewrite
//! output = "dist"            # Output tree (wiped on every build)
//!
//! [encoding]
//! avif_quality = 65          # 1-100
//! avif_speed = 6             # 1 (slowest) - 10 (fastest)
//!
//! [responsive]
//! sizes = "(max-width: 680px) calc(100vw - 40px), 335px"
//! raster_extensions = ["png"]
//!
//! [processing]
//! max_processes = 4          # Max parallel workers (omit for auto = CPU cores)
//!
//! [images]
//! "column_1.png" = { widths = [400, 800, 1200] }
//! "seeds_left_top.png" = { width = 320 }
//! "seeds_left_bottom.png" = { height = 176 }
//! ```
//!
//! Unknown keys are rejected to catch typos early. Each `[images]` entry must
//! be exactly one of `width`, `height` or `widths` (plus an optional `sizes`
//! next to `widths`).
//!
//! ## Output Layout
//!
//! The output tree is not configurable beyond its root; see [`BuildLayout`].
//! That root is wiped on every build, so it must be a relative subdirectory
//! with no `..` that neither contains nor sits inside a source path.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Default config filename, looked up in the project root.
pub const CONFIG_FILENAME: &str = "asset-press.toml";

/// Image URL prefix used in templates, and the image subtree of the output.
pub const IMAGE_URL_PREFIX: &str = "assets/images";

/// Manifest filename inside the output root.
pub const MANIFEST_FILENAME: &str = "image-manifest.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `asset-press.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Source locations, relative to the project root.
    pub paths: PathsConfig,
    /// Encoder settings.
    pub encoding: EncodingConfig,
    /// `<picture>` markup settings.
    pub responsive: ResponsiveConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Resize table: source filename → resize spec. Files not listed here are
    /// left alone.
    pub images: BTreeMap<String, ResizeSpec>,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.encoding.avif_quality) {
            return Err(ConfigError::Validation(
                "encoding.avif_quality must be 1-100".into(),
            ));
        }
        if !(1..=10).contains(&self.encoding.avif_speed) {
            return Err(ConfigError::Validation(
                "encoding.avif_speed must be 1-10".into(),
            ));
        }
        if self.responsive.raster_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "responsive.raster_extensions must not be empty".into(),
            ));
        }
        self.paths
            .validate_output()
            .map_err(|msg| ConfigError::Validation(format!("paths.output: {msg}")))?;
        for (filename, spec) in &self.images {
            spec.validate()
                .map_err(|msg| ConfigError::Validation(format!("images.\"{filename}\": {msg}")))?;
        }
        Ok(())
    }
}

/// Source locations, relative to the project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub images: PathBuf,
    pub css: PathBuf,
    pub fonts: PathBuf,
    pub template: PathBuf,
    pub output: PathBuf,
}

impl PathsConfig {
    /// The output tree is wiped on every build, so it must be a relative
    /// subdirectory of the root that shares nothing with the sources.
    fn validate_output(&self) -> Result<(), String> {
        if self.output.has_root() {
            return Err("must be relative to the project root".into());
        }
        if self.output.components().any(|c| c == Component::ParentDir) {
            return Err("must not contain `..`".into());
        }
        let output = without_cur_dir(&self.output);
        if output.as_os_str().is_empty() {
            return Err("must name a subdirectory of the project root".into());
        }
        for (key, dir) in [
            ("images", &self.images),
            ("css", &self.css),
            ("fonts", &self.fonts),
        ] {
            let dir = without_cur_dir(dir);
            if dir.starts_with(&output) || output.starts_with(&dir) {
                return Err(format!("must not overlap paths.{key}"));
            }
        }
        if without_cur_dir(&self.template).starts_with(&output) {
            return Err("must not contain paths.template".into());
        }
        Ok(())
    }
}

fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| *c != Component::CurDir)
        .collect()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            images: PathBuf::from("assets/images"),
            css: PathBuf::from("assets/css"),
            fonts: PathBuf::from("assets/fonts"),
            template: PathBuf::from("index.html"),
            output: PathBuf::from("dist"),
        }
    }
}

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    /// AVIF quality (1 = worst, 100 = best).
    pub avif_quality: u32,
    /// rav1e speed preset (1 = slowest/smallest, 10 = fastest).
    pub avif_speed: u8,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            avif_quality: 65,
            avif_speed: 6,
        }
    }
}

/// `<picture>` markup settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResponsiveConfig {
    /// Default CSS `sizes` attribute for multi-width images.
    pub sizes: String,
    /// Extensions of raster `<img>` sources the rewriter looks at.
    pub raster_extensions: Vec<String>,
}

impl Default for ResponsiveConfig {
    fn default() -> Self {
        Self {
            sizes: "(max-width: 680px) calc(100vw - 40px), 335px".to_string(),
            raster_extensions: vec!["png".to_string()],
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
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
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// How one source image is resized.
///
/// Exactly one shape is accepted per entry; TOML tables with a mix of keys
/// match no variant and fail to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResizeSpec {
    /// Fixed width, height follows the aspect ratio.
    Width { width: u32 },
    /// Fixed height, width follows the aspect ratio.
    Height { height: u32 },
    /// One variant set per width; the largest is the fallback.
    Widths {
        widths: Vec<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sizes: Option<String>,
    },
}

// serde's untagged enums can't carry `deny_unknown_fields` per variant, so
// the strictness lives in a shadow type.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawResizeSpec {
    width: Option<u32>,
    height: Option<u32>,
    widths: Option<Vec<u32>>,
    sizes: Option<String>,
}

impl ResizeSpec {
    fn validate(&self) -> Result<(), String> {
        match self {
            ResizeSpec::Width { width: 0 } => Err("width must be non-zero".into()),
            ResizeSpec::Height { height: 0 } => Err("height must be non-zero".into()),
            ResizeSpec::Widths { widths, .. } if widths.is_empty() => {
                Err("widths must not be empty".into())
            }
            ResizeSpec::Widths { widths, .. } if widths.contains(&0) => {
                Err("widths must be non-zero".into())
            }
            _ => Ok(()),
        }
    }

    /// Target widths in ascending order, duplicates removed.
    pub fn sorted_widths(widths: &[u32]) -> Vec<u32> {
        let mut sorted = widths.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        sorted
    }
}

impl TryFrom<RawResizeSpec> for ResizeSpec {
    type Error = String;

    fn try_from(raw: RawResizeSpec) -> Result<Self, Self::Error> {
        match (raw.width, raw.height, raw.widths, raw.sizes) {
            (Some(width), None, None, None) => Ok(ResizeSpec::Width { width }),
            (None, Some(height), None, None) => Ok(ResizeSpec::Height { height }),
            (None, None, Some(widths), sizes) => Ok(ResizeSpec::Widths { widths, sizes }),
            (None, None, None, _) => Err("expected one of `width`, `height` or `widths`".into()),
            (_, _, None, Some(_)) => Err("`sizes` is only allowed together with `widths`".into()),
            _ => Err("only one of `width`, `height` or `widths` may be set".into()),
        }
    }
}

/// Parse the `[images]` table with per-entry error messages.
fn parse_images(value: toml::Value) -> Result<BTreeMap<String, ResizeSpec>, ConfigError> {
    let raw: BTreeMap<String, RawResizeSpec> = value.try_into()?;
    raw.into_iter()
        .map(|(filename, spec)| {
            ResizeSpec::try_from(spec)
                .map(|spec| (filename.clone(), spec))
                .map_err(|msg| ConfigError::Validation(format!("images.\"{filename}\": {msg}")))
        })
        .collect()
}

/// Absolute locations of every input and output the pipeline touches.
///
/// ```text
/// <output>/
/// ├── index.html             # rewritten template
/// ├── image-manifest.json    # stage hand-off
/// └── assets/
///     ├── images/            # variants + hashed SVGs
///     ├── css/
///     └── fonts/
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BuildLayout {
    pub source_images: PathBuf,
    pub source_css: PathBuf,
    pub source_fonts: PathBuf,
    pub template: PathBuf,
    pub output: PathBuf,
    pub output_images: PathBuf,
    pub output_css: PathBuf,
    pub output_fonts: PathBuf,
    pub output_html: PathBuf,
    pub manifest: PathBuf,
}

impl BuildLayout {
    pub fn resolve(root: &Path, paths: &PathsConfig) -> Self {
        let output = root.join(&paths.output);
        let template_name = paths
            .template
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("index.html"));
        Self {
            source_images: root.join(&paths.images),
            source_css: root.join(&paths.css),
            source_fonts: root.join(&paths.fonts),
            template: root.join(&paths.template),
            output_images: output.join(IMAGE_URL_PREFIX),
            output_css: output.join("assets/css"),
            output_fonts: output.join("assets/fonts"),
            output_html: output.join(template_name),
            manifest: output.join(MANIFEST_FILENAME),
            output,
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PipelineConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
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

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(stock_defaults_value(), ov),
        None => stock_defaults_value(),
    };
    let mut merged = match merged {
        toml::Value::Table(table) => table,
        _ => return Err(ConfigError::Validation("config must be a table".into())),
    };
    // Resize entries go through the strict shadow type first.
    let images = match merged.remove("images") {
        Some(value) => parse_images(value)?,
        None => BTreeMap::new(),
    };
    let mut config: PipelineConfig = toml::Value::Table(merged).try_into()?;
    config.images = images;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file.
///
/// A missing file yields stock defaults. Otherwise user values are merged on
/// top of stock defaults, unknown keys are rejected, and the result validated.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `asset-press.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# asset-press configuration
# ========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Source locations (relative to the project root)
# ---------------------------------------------------------------------------
[paths]
images = "assets/images"
css = "assets/css"
fonts = "assets/fonts"
template = "index.html"
# Wiped and rebuilt on every `build`.
output = "dist"

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[encoding]
# AVIF quality (1 = worst, 100 = best).
avif_quality = 65
# rav1e speed preset (1 = slowest/smallest, 10 = fastest).
avif_speed = 6

# ---------------------------------------------------------------------------
# <picture> markup
# ---------------------------------------------------------------------------
[responsive]
# CSS sizes attribute for images generated at several widths.
sizes = "(max-width: 680px) calc(100vw - 40px), 335px"
# <img src="assets/images/*.EXT"> tags with these extensions are rewritten.
raster_extensions = ["png"]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Images to optimize: filename in [paths].images -> resize spec
# ---------------------------------------------------------------------------
# Exactly one of:
#   { width = N }                    fixed width, height keeps aspect ratio
#   { height = N }                   fixed height, width keeps aspect ratio
#   { widths = [A, B, C] }           srcset at several widths, largest = fallback
#   { widths = [...], sizes = "…" }  ... with its own CSS sizes attribute
[images]
# "column_1.png" = { widths = [400, 800, 1200] }
# "seeds_left_top.png" = { width = 320 }
# "seeds_left_bottom.png" = { height = 176 }
"##
}
