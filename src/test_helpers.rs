//! Shared test utilities for the asset-press test suite.
//!
//! Synthetic images, canned manifest entries with recognisable hashes, and a
//! throwaway project tree laid out like the stock config expects.
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = setup_project();
//! let layout = BuildLayout::resolve(tmp.path(), &PathsConfig::default());
//! assert!(layout.template.exists());
//! ```

use image::{Rgba, RgbaImage};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::hashing::{HASH_LEN, hashed_filename};
use crate::manifest::{FormatSet, Manifest, SrcsetEntry, VariantEntry};

// =========================================================================
// Synthetic images
// =========================================================================

/// Opaque two-axis gradient. Anything larger than 16x16 has more than 256
/// distinct colours.
pub fn gradient_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
            255,
        ])
    })
}

/// Write a real PNG of the given size to `path`.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    gradient_image(width, height).save(path).unwrap();
}

// =========================================================================
// Manifest entries
// =========================================================================

/// Fake hashes: `a` for AVIF, `b` for WebP, `c` for PNG.
fn fake_files(stem: &str, tag: Option<&str>) -> FormatSet {
    let name = |hash: char, ext: &str| {
        hashed_filename(stem, tag, &hash.to_string().repeat(HASH_LEN), ext)
    };
    FormatSet {
        avif: name('a', "avif"),
        webp: name('b', "webp"),
        png: name('c', "png"),
    }
}

/// Entry for an image generated at one size.
pub fn single_size_entry(stem: &str, width: u32, height: u32) -> VariantEntry {
    VariantEntry {
        fallback: fake_files(stem, None),
        width,
        height,
        srcset: None,
        sizes: None,
    }
}

/// Entry for a 4:3 image generated at each of `widths` (ascending).
pub fn multi_width_entry(stem: &str, widths: &[u32]) -> VariantEntry {
    let srcset: Vec<SrcsetEntry> = widths
        .iter()
        .map(|&w| SrcsetEntry {
            files: fake_files(stem, Some(&format!("{}x{}", w, w * 3 / 4))),
            width: w,
        })
        .collect();
    let largest = *widths.last().unwrap();
    VariantEntry {
        fallback: srcset.last().unwrap().files.clone(),
        width: largest,
        height: largest * 3 / 4,
        srcset: Some(srcset),
        sizes: Some("(max-width: 680px) 100vw, 335px".to_string()),
    }
}

/// Two raster entries, no vector map.
pub fn sample_manifest() -> Manifest {
    let mut images = BTreeMap::new();
    images.insert(
        "column_1.png".to_string(),
        multi_width_entry("column_1", &[400, 800, 1200]),
    );
    images.insert(
        "seeds.png".to_string(),
        single_size_entry("seeds", 320, 210),
    );
    Manifest {
        vectors: None,
        images,
    }
}

// =========================================================================
// Project tree
// =========================================================================

pub const SAMPLE_TEMPLATE: &str = r#"<!doctype html>
<html>
  <body>
    <img class="logo" src="assets/images/logo.svg" alt="Logo" />
    <section>
      <img class="hero" src="assets/images/column_1.png" alt="Column one" />
    </section>
  </body>
</html>
"#;

/// A project root in a temp dir with the stock `[paths]` layout: two PNGs,
/// one SVG, a style sheet, a font, and [`SAMPLE_TEMPLATE`].
pub fn setup_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    for dir in ["assets/images", "assets/css", "assets/fonts"] {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
    write_test_png(&root.join("assets/images/column_1.png"), 160, 120);
    write_test_png(&root.join("assets/images/seeds.png"), 90, 60);
    fs::write(
        root.join("assets/images/logo.svg"),
        r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#,
    )
    .unwrap();
    fs::write(root.join("assets/css/site.css"), "body { margin: 0; }\n").unwrap();
    fs::write(root.join("assets/fonts/body.woff2"), [0x77u8, 0x4f, 0x46, 0x32]).unwrap();
    fs::write(root.join("index.html"), SAMPLE_TEMPLATE).unwrap();
    tmp
}
