//! Template rewriting: raster `<img>` → `<picture>`, SVG `src` → hashed name.
//!
//! Stage 3 of the build pipeline. Works on the raw template text with two
//! line-oriented regular expressions rather than a DOM, so everything outside
//! a matched tag is emitted byte-for-byte.
//!
//! ## Raster rule
//!
//! An `<img … src="assets/images/NAME.png" … />` that starts its line (after
//! indentation) and whose `NAME.png` is in the manifest becomes:
//!
//! ```html
//! <picture>
//!   <source srcset="…" sizes="…" type="image/avif" />
//!   <source srcset="…" sizes="…" type="image/webp" />
//!   <img srcset="…" sizes="…" src="assets/images/NAME.HASH.png" alt="…" width="W" height="H" />
//! </picture>
//! ```
//!
//! `sizes` and the `<img>` `srcset` are only present for images generated at
//! several widths. Attributes other than `src` are carried over verbatim,
//! whitespace between them collapsed. Tags spanning several lines match too.
//!
//! Attribute values containing a literal `>` end the match early; such tags
//! are left as they are.
//!
//! ## Vector rule
//!
//! Any `src="assets/images/NAME.svg"` whose name is in the manifest's vector
//! map gets the hashed name. Runs after the raster pass.

use crate::imaging::OutputFormat;
use crate::manifest::{FormatSet, Manifest, ManifestError, SrcsetEntry, VariantEntry};
use regex::{Captures, Regex, escape as regex_escape};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("Invalid rewrite pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Rewritten HTML plus how many replacements each rule made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub html: String,
    pub pictures: usize,
    pub vectors: usize,
}

/// Compiled rewrite rules for one URL prefix.
#[derive(Debug, Clone)]
pub struct TemplateRewriter {
    prefix: String,
    raster: Regex,
    src_attr: Regex,
    vector: Regex,
}

impl TemplateRewriter {
    /// `url_prefix` is the path images are referenced under in the template
    /// (`assets/images`); `raster_extensions` the `src` extensions eligible
    /// for `<picture>` replacement.
    pub fn new(url_prefix: &str, raster_extensions: &[String]) -> Result<Self, RewriteError> {
        let prefix = url_prefix.trim_end_matches('/').to_string();
        let escaped = regex_escape(&prefix);
        let extensions = raster_extensions
            .iter()
            .map(|e| regex_escape(e.trim_start_matches('.')))
            .collect::<Vec<_>>()
            .join("|");

        let raster = Regex::new(&format!(
            r#"(?m)^([ \t]*)<img\b([^>]*?\bsrc="{escaped}/([^"]+\.(?:{extensions}))"[^>]*?)/>"#
        ))?;
        let src_attr = Regex::new(&format!(
            r#"\bsrc="{escaped}/[^"]+\.(?:{extensions})""#
        ))?;
        let vector = Regex::new(&format!(r#"src="{escaped}/([^"]+\.svg)""#))?;

        Ok(Self {
            prefix,
            raster,
            src_attr,
            vector,
        })
    }

    /// Apply both rules to `template`. Unknown filenames pass through.
    pub fn rewrite(&self, template: &str, manifest: &Manifest) -> Rewritten {
        let mut pictures = 0;
        let html = self.raster.replace_all(template, |caps: &Captures| {
            match manifest.get(&caps[3]) {
                Some(entry) => {
                    pictures += 1;
                    self.picture_block(&caps[1], &caps[2], entry)
                }
                None => caps[0].to_string(),
            }
        });

        let mut vectors = 0;
        let html = self
            .vector
            .replace_all(&html, |caps: &Captures| match manifest.vector(&caps[1]) {
                Some(hashed) => {
                    vectors += 1;
                    format!(r#"src="{}/{}""#, self.prefix, hashed)
                }
                None => caps[0].to_string(),
            })
            .into_owned();

        Rewritten {
            html,
            pictures,
            vectors,
        }
    }

    fn url(&self, filename: &str) -> String {
        format!("{}/{}", self.prefix, filename)
    }

    /// `url 400w, url 800w, …` in stored order.
    fn srcset_list(&self, srcset: &[SrcsetEntry], pick: impl Fn(&FormatSet) -> &str) -> String {
        srcset
            .iter()
            .map(|v| format!("{} {}w", self.url(pick(&v.files)), v.width))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn picture_block(&self, indent: &str, attrs: &str, entry: &VariantEntry) -> String {
        let other_attrs = self.src_attr.replace(attrs, "");
        let other_attrs = WHITESPACE.replace_all(&other_attrs, " ");
        let other_attrs = other_attrs.trim();
        let other_attrs = if other_attrs.is_empty() {
            String::new()
        } else {
            format!(" {other_attrs}")
        };

        let sizes = entry
            .sizes
            .as_deref()
            .map(|s| format!(r#" sizes="{s}""#))
            .unwrap_or_default();

        let (avif, webp, png) = match &entry.srcset {
            Some(srcset) => (
                self.srcset_list(srcset, |f| f.avif.as_str()),
                self.srcset_list(srcset, |f| f.webp.as_str()),
                Some(self.srcset_list(srcset, |f| f.png.as_str())),
            ),
            None => (
                self.url(&entry.fallback.avif),
                self.url(&entry.fallback.webp),
                None,
            ),
        };

        let img_srcset = png
            .map(|list| format!(r#"srcset="{list}"{sizes} "#))
            .unwrap_or_default();

        [
            format!("{indent}<picture>"),
            format!(
                r#"{indent}  <source srcset="{avif}"{sizes} type="{}" />"#,
                OutputFormat::Avif.mime_type()
            ),
            format!(
                r#"{indent}  <source srcset="{webp}"{sizes} type="{}" />"#,
                OutputFormat::WebP.mime_type()
            ),
            format!(
                r#"{indent}  <img {img_srcset}src="{}"{other_attrs} width="{}" height="{}" />"#,
                self.url(&entry.fallback.png),
                entry.width,
                entry.height
            ),
            format!("{indent}</picture>"),
        ]
        .join("\n")
    }
}

/// Read `template`, rewrite it against the manifest at `manifest_path`, and
/// write the result to `output`.
pub fn rewrite_template(
    rewriter: &TemplateRewriter,
    template: &Path,
    manifest_path: &Path,
    output: &Path,
) -> Result<Rewritten, RewriteError> {
    let manifest = Manifest::load(manifest_path)?;
    let source = fs::read_to_string(template)?;
    let rewritten = rewriter.rewrite(&source, &manifest);
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, &rewritten.html)?;
    Ok(rewritten)
}
