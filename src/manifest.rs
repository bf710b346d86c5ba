//! The image manifest: the hand-off contract between pipeline stages.
//!
//! The image stage writes one [`VariantEntry`] per configured source image.
//! The asset stage adds the reserved `_svg` key holding the [`VectorMap`].
//! The template stage only reads it.
//!
//! ```json
//! {
//!   "_svg": { "logo.svg": "logo.1a2b3c4d5e.svg" },
//!   "column_1.png": {
//!     "avif": "column_1.1200x900.0f1e2d3c4b.avif",
//!     "webp": "column_1.1200x900.9a8b7c6d5e.webp",
//!     "png": "column_1.1200x900.5f4e3d2c1b.png",
//!     "width": 1200,
//!     "height": 900,
//!     "srcset": [
//!       { "avif": "…", "webp": "…", "png": "…", "width": 400 },
//!       …
//!     ],
//!     "sizes": "(max-width: 680px) calc(100vw - 40px), 335px"
//!   },
//!   "seeds_left_top.png": { "avif": "…", "webp": "…", "png": "…", "width": 320, "height": 210 }
//! }
//! ```
//!
//! Maps are ordered so the file is byte-stable for identical builds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Reserved manifest key for the vector map.
pub const VECTOR_KEY: &str = "_svg";

/// Original SVG filename → hashed SVG filename.
pub type VectorMap = BTreeMap<String, String>;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error reading/writing manifest {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One filename per output format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSet {
    pub avif: String,
    pub webp: String,
    pub png: String,
}

/// One width of a multi-width image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrcsetEntry {
    #[serde(flatten)]
    pub files: FormatSet,
    pub width: u32,
}

/// Generated outputs for one source raster image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantEntry {
    /// Largest/default rendition.
    #[serde(flatten)]
    pub fallback: FormatSet,
    pub width: u32,
    pub height: u32,
    /// Ascending widths; only for images generated at several widths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srcset: Option<Vec<SrcsetEntry>>,
    /// CSS sizes attribute; only present together with `srcset`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "_svg", default, skip_serializing_if = "Option::is_none")]
    pub vectors: Option<VectorMap>,
    #[serde(flatten)]
    pub images: BTreeMap<String, VariantEntry>,
}

impl Manifest {
    pub fn get(&self, filename: &str) -> Option<&VariantEntry> {
        self.images.get(filename)
    }

    /// Hashed name for an SVG, if the asset stage has run and knows it.
    pub fn vector(&self, filename: &str) -> Option<&str> {
        self.vectors
            .as_ref()
            .and_then(|map| map.get(filename))
            .map(String::as_str)
    }

    /// The same manifest with the reserved vector key set. Raster entries
    /// are carried over untouched.
    pub fn with_vectors(self, vectors: VectorMap) -> Self {
        Self {
            vectors: Some(vectors),
            images: self.images,
        }
    }

    pub fn to_json(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Read the persisted manifest, set the vector key, write the whole file back.
pub fn merge_vectors_into(path: &Path, vectors: VectorMap) -> Result<Manifest, ManifestError> {
    let merged = Manifest::load(path)?.with_vectors(vectors);
    merged.save(path)?;
    Ok(merged)
}
