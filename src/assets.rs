//! Static asset copying and SVG content hashing.
//!
//! Stage 2 of the build pipeline. Copies style sheets and fonts into the
//! output tree byte-for-byte, copies every SVG from the source image
//! directory under a content-hashed name, and merges the resulting
//! [`VectorMap`] into the manifest written by the image stage.
//!
//! There is no rollback: a failed copy leaves the output tree half-written.
//! [`clean_output`] runs before every full build for that reason.

use crate::config::BuildLayout;
use crate::hashing::{hash_file, hashed_filename};
use crate::manifest::{ManifestError, VectorMap, merge_vectors_into};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("Asset directory not found: {0}")]
    MissingDir(PathBuf),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// What the asset stage did, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetReport {
    /// Copied directories (output path) with their file counts.
    pub copied: Vec<(PathBuf, usize)>,
    pub vectors: VectorMap,
}

/// Remove the output tree if it exists and recreate it empty.
pub fn clean_output(dir: &Path) -> std::io::Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)
}

/// Recursively copy `src` into `dst`, returning the number of files copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<usize, AssetError> {
    if !src.is_dir() {
        return Err(AssetError::MissingDir(src.to_path_buf()));
    }
    fs::create_dir_all(dst)?;

    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| AssetError::Walk {
            path: src.to_path_buf(),
            source,
        })?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Lowercase `.svg` only, matching what the template rewriter looks for.
fn is_svg(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("svg")
}

/// Copy every SVG directly inside `source_dir` to `output_dir` as
/// `<stem>.<hash>.svg` and return the original → hashed name map.
pub fn hash_vectors(source_dir: &Path, output_dir: &Path) -> Result<VectorMap, AssetError> {
    fs::create_dir_all(output_dir)?;

    let mut vectors = VectorMap::new();
    for entry in fs::read_dir(source_dir)? {
        let path = entry?.path();
        if !path.is_file() || !is_svg(&path) {
            continue;
        }
        let (Some(filename), Some(stem)) = (
            path.file_name().and_then(|n| n.to_str()),
            path.file_stem().and_then(|s| s.to_str()),
        ) else {
            continue;
        };

        let hashed = hashed_filename(stem, None, &hash_file(&path)?, "svg");
        fs::copy(&path, output_dir.join(&hashed))?;
        vectors.insert(filename.to_string(), hashed);
    }
    Ok(vectors)
}

/// Run the whole asset stage against `layout`.
///
/// The manifest at `layout.manifest` must already exist; its raster
/// entries are preserved and the vector map is added under `_svg`.
pub fn materialize(layout: &BuildLayout) -> Result<AssetReport, AssetError> {
    let mut copied = Vec::new();
    for (src, dst) in [
        (&layout.source_css, &layout.output_css),
        (&layout.source_fonts, &layout.output_fonts),
    ] {
        let count = copy_dir_recursive(src, dst)?;
        copied.push((dst.clone(), count));
    }

    let vectors = hash_vectors(&layout.source_images, &layout.output_images)?;
    merge_vectors_into(&layout.manifest, vectors.clone())?;

    Ok(AssetReport { copied, vectors })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathsConfig;
    use crate::hashing::content_hash;
    use crate::manifest::Manifest;
    use crate::test_helpers::{sample_manifest, setup_project};
    use tempfile::TempDir;

    #[test]
    fn clean_output_removes_stale_files() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("dist");
        fs::create_dir_all(out.join("old")).unwrap();
        fs::write(out.join("old/stale.txt"), "x").unwrap();

        clean_output(&out).unwrap();

        assert!(out.is_dir());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn clean_output_creates_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("fresh/dist");
        clean_output(&out).unwrap();
        assert!(out.is_dir());
    }

    #[test]
    fn copy_dir_recursive_copies_nested_files_verbatim() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("fonts");
        fs::create_dir_all(src.join("inter")).unwrap();
        fs::write(src.join("inter/regular.woff2"), [0u8, 159, 146, 150]).unwrap();
        fs::write(src.join("LICENSE.txt"), "OFL").unwrap();

        let dst = tmp.path().join("out/fonts");
        let count = copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            fs::read(dst.join("inter/regular.woff2")).unwrap(),
            vec![0u8, 159, 146, 150]
        );
        assert_eq!(fs::read_to_string(dst.join("LICENSE.txt")).unwrap(), "OFL");
    }

    #[test]
    fn copy_dir_recursive_missing_source_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let result = copy_dir_recursive(&tmp.path().join("nope"), &tmp.path().join("out"));
        assert!(matches!(result, Err(AssetError::MissingDir(_))));
    }

    #[test]
    fn hash_vectors_only_takes_svgs() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("images");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("logo.svg"), "<svg>logo</svg>").unwrap();
        fs::write(src.join("icon.SVG"), "<svg>icon</svg>").unwrap();
        fs::write(src.join("photo.png"), "not svg").unwrap();

        let out = tmp.path().join("out");
        let vectors = hash_vectors(&src, &out).unwrap();

        assert_eq!(vectors.len(), 1);
        let hashed = &vectors["logo.svg"];
        assert_eq!(
            hashed,
            &format!("logo.{}.svg", content_hash(b"<svg>logo</svg>"))
        );
        assert_eq!(fs::read_to_string(out.join(hashed)).unwrap(), "<svg>logo</svg>");
        assert!(!out.join("photo.png").exists());
    }

    #[test]
    fn hash_vectors_skips_uppercase_extension() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("images");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("icon.SVG"), "<svg>icon</svg>").unwrap();

        let out = tmp.path().join("out");
        let vectors = hash_vectors(&src, &out).unwrap();

        assert!(vectors.is_empty());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn hash_vectors_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("images");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("logo.svg"), "<svg/>").unwrap();

        let first = hash_vectors(&src, &tmp.path().join("a")).unwrap();
        let second = hash_vectors(&src, &tmp.path().join("b")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn materialize_merges_without_dropping_raster_entries() {
        let tmp = setup_project();
        let layout = BuildLayout::resolve(tmp.path(), &PathsConfig::default());
        fs::create_dir_all(&layout.output).unwrap();
        let before = sample_manifest();
        before.save(&layout.manifest).unwrap();

        let report = materialize(&layout).unwrap();

        let after = Manifest::load(&layout.manifest).unwrap();
        assert_eq!(after.images, before.images);
        assert_eq!(after.vectors.as_ref(), Some(&report.vectors));
        assert!(report.vectors.contains_key("logo.svg"));
        assert!(layout.output_css.join("site.css").exists());
        assert!(layout.output_fonts.join("body.woff2").exists());
        assert_eq!(report.copied.len(), 2);
    }

    #[test]
    fn materialize_without_manifest_fails() {
        let tmp = setup_project();
        let layout = BuildLayout::resolve(tmp.path(), &PathsConfig::default());
        let result = materialize(&layout);
        assert!(matches!(result, Err(AssetError::Manifest(_))));
    }
}
