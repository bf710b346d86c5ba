//! # asset-press
//!
//! A build tool for a single-page static site. It turns a handful of source
//! PNGs into responsive AVIF/WebP/PNG variants with content-hashed names,
//! copies style sheets and fonts, fingerprints SVGs, and rewrites one HTML
//! template so every raster `<img>` becomes a `<picture>` element.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 0. Clean    dist/                         (wipe and recreate)
//! 1. Images   images + [images] table  →  dist/assets/images + image-manifest.json
//! 2. Assets   css, fonts, *.svg        →  dist/assets/…     + `_svg` merged into manifest
//! 3. HTML     index.html + manifest    →  dist/index.html
//! ```
//!
//! The manifest file on disk is the only hand-off between stages, so each
//! stage can also be run on its own from the CLI and inspected in between.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `asset-press.toml` loading, validation, merging, output layout |
//! | [`imaging`] | Pure-Rust decode, resize, encode (AVIF, WebP, indexed PNG), identify |
//! | [`hashing`] | Truncated SHA-256 content hashes and hashed filenames |
//! | [`manifest`] | The JSON manifest shared by the stages |
//! | [`process`] | Stage 1: parallel variant generation for every configured image |
//! | [`assets`] | Stage 2: static asset copying and SVG fingerprinting |
//! | [`rewrite`] | Stage 3: `<img>` → `<picture>` and SVG reference rewriting |
//! | [`output`] | CLI output formatting for every stage |
//!
//! # Design Decisions
//!
//! ## Content-Hashed Filenames
//!
//! Every emitted image carries the first ten hex digits of the SHA-256 of its
//! own bytes. Files can be served with far-future cache headers; a changed
//! image gets a new URL. All encoders are deterministic, so an unchanged
//! source keeps its URLs across builds.
//!
//! ## Regex Rewriting Over a DOM
//!
//! The template is edited in place with two patterns. Everything outside a
//! matched tag, including formatting and comments, is kept byte-for-byte.
//! The price is that `<img>` tags must start their line and must not contain
//! a literal `>` inside an attribute value.
//!
//! ## Pure-Rust Imaging
//!
//! `image` (Lanczos3, rav1e AVIF, lossless WebP) plus `png` and `color_quant`
//! for palette PNGs. No system libraries, so the binary is self-contained.

pub mod assets;
pub mod config;
pub mod hashing;
pub mod imaging;
pub mod manifest;
pub mod output;
pub mod process;
pub mod rewrite;

#[cfg(test)]
pub(crate) mod test_helpers;
