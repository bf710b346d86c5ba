//! CLI output formatting for all pipeline stages.
//!
//! # Output Format
//!
//! ```text
//!   Cleaned dist/
//! ==> Stage 1: Optimizing images
//!   Optimizing 3 images
//!   seeds_left_top.png: 512.3 KB → AVIF 8.1 KB, WebP 40.2 KB, PNG 31.0 KB
//!   column_1.png: 1.2 MB → 3 sizes (400w, 800w, 1200w), largest WebP 96.4 KB
//!   Manifest written to dist/image-manifest.json
//!   Optimized 3 images
//! ==> Stage 2: Copying static assets
//!   Copied dist/assets/css/ (2 files)
//!   Copied dist/assets/fonts/ (4 files)
//!   Hashed 2 SVG files
//! ==> Stage 3: Building HTML
//!   Written dist/index.html
//!   Replaced 3 <img> tags with <picture> elements
//!   Hashed 2 SVG references
//! ```
//!
//! Image lines arrive in completion order, not config order.
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::assets::AssetReport;
use crate::process::ProcessEvent;
use crate::rewrite::Rewritten;
use std::path::Path;

/// Human-readable byte count: `B` under 1 KiB, then `KB` and `MB` with one
/// decimal.
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

/// `==> Stage N: title`
pub fn format_stage_header(stage: usize, title: &str) -> String {
    format!("==> Stage {}: {}", stage, title)
}

pub fn print_stage_header(stage: usize, title: &str) {
    println!("{}", format_stage_header(stage, title));
}

// ============================================================================
// Clean
// ============================================================================

pub fn format_clean_output(output: &Path) -> Vec<String> {
    vec![format!("  Cleaned {}/", output.display())]
}

pub fn print_clean_output(output: &Path) {
    for line in format_clean_output(output) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 1: Images
// ============================================================================

/// Format a single image-stage progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Started { image_count } => {
            vec![format!("  Optimizing {} images", image_count)]
        }
        ProcessEvent::ImageProcessed {
            filename,
            source_bytes,
            multi_width,
            variants,
        } => {
            let Some(largest) = variants.last() else {
                return vec![format!("  {}: no variants", filename)];
            };
            let line = if *multi_width {
                let widths: Vec<String> = variants.iter().map(|v| format!("{}w", v.width)).collect();
                format!(
                    "  {}: {} → {} sizes ({}), largest WebP {}",
                    filename,
                    format_bytes(*source_bytes),
                    variants.len(),
                    widths.join(", "),
                    format_bytes(largest.sizes.webp)
                )
            } else {
                format!(
                    "  {}: {} → AVIF {}, WebP {}, PNG {}",
                    filename,
                    format_bytes(*source_bytes),
                    format_bytes(largest.sizes.avif),
                    format_bytes(largest.sizes.webp),
                    format_bytes(largest.sizes.png)
                )
            };
            vec![line]
        }
    }
}

/// Summary after the manifest is on disk.
pub fn format_process_summary(manifest_path: &Path, image_count: usize) -> Vec<String> {
    vec![
        format!("  Manifest written to {}", manifest_path.display()),
        format!("  Optimized {} images", image_count),
    ]
}

pub fn print_process_summary(manifest_path: &Path, image_count: usize) {
    for line in format_process_summary(manifest_path, image_count) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Assets
// ============================================================================

pub fn format_asset_report(report: &AssetReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .copied
        .iter()
        .map(|(dir, count)| {
            let noun = if *count == 1 { "file" } else { "files" };
            format!("  Copied {}/ ({} {})", dir.display(), count, noun)
        })
        .collect();
    lines.push(format!("  Hashed {} SVG files", report.vectors.len()));
    lines
}

pub fn print_asset_report(report: &AssetReport) {
    for line in format_asset_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 3: HTML
// ============================================================================

pub fn format_rewrite_output(result: &Rewritten, output: &Path) -> Vec<String> {
    vec![
        format!("  Written {}", output.display()),
        format!(
            "  Replaced {} <img> tags with <picture> elements",
            result.pictures
        ),
        format!("  Hashed {} SVG references", result.vectors),
    ]
}

pub fn print_rewrite_output(result: &Rewritten, output: &Path) {
    for line in format_rewrite_output(result, output) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::EncodedSizes;
    use crate::manifest::VectorMap;
    use crate::process::VariantInfo;
    use std::path::PathBuf;

    fn variant(width: u32, webp: u64) -> VariantInfo {
        VariantInfo {
            width,
            height: width * 3 / 4,
            sizes: EncodedSizes {
                avif: 2048,
                webp,
                png: 512,
            },
        }
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.0 MB");
        assert_eq!(format_bytes(1_258_291), "1.2 MB");
    }

    #[test]
    fn stage_header() {
        assert_eq!(
            format_stage_header(2, "Copying static assets"),
            "==> Stage 2: Copying static assets"
        );
    }

    #[test]
    fn started_event() {
        let lines = format_process_event(&ProcessEvent::Started { image_count: 4 });
        assert_eq!(lines, vec!["  Optimizing 4 images"]);
    }

    #[test]
    fn single_size_image_lists_every_format() {
        let event = ProcessEvent::ImageProcessed {
            filename: "seeds.png".to_string(),
            source_bytes: 3072,
            multi_width: false,
            variants: vec![variant(320, 1024)],
        };
        assert_eq!(
            format_process_event(&event),
            vec!["  seeds.png: 3.0 KB → AVIF 2.0 KB, WebP 1.0 KB, PNG 512 B"]
        );
    }

    #[test]
    fn multi_width_image_lists_widths_and_largest_webp() {
        let event = ProcessEvent::ImageProcessed {
            filename: "column_1.png".to_string(),
            source_bytes: 1_258_291,
            multi_width: true,
            variants: vec![variant(400, 100), variant(800, 2048), variant(1200, 4096)],
        };
        assert_eq!(
            format_process_event(&event),
            vec!["  column_1.png: 1.2 MB → 3 sizes (400w, 800w, 1200w), largest WebP 4.0 KB"]
        );
    }

    #[test]
    fn process_summary_lines() {
        let lines = format_process_summary(Path::new("dist/image-manifest.json"), 3);
        assert_eq!(
            lines,
            vec![
                "  Manifest written to dist/image-manifest.json",
                "  Optimized 3 images"
            ]
        );
    }

    #[test]
    fn asset_report_lines() {
        let mut vectors = VectorMap::new();
        vectors.insert("a.svg".to_string(), "a.0000000000.svg".to_string());
        let report = AssetReport {
            copied: vec![
                (PathBuf::from("dist/assets/css"), 1),
                (PathBuf::from("dist/assets/fonts"), 4),
            ],
            vectors,
        };
        assert_eq!(
            format_asset_report(&report),
            vec![
                "  Copied dist/assets/css/ (1 file)",
                "  Copied dist/assets/fonts/ (4 files)",
                "  Hashed 1 SVG files",
            ]
        );
    }

    #[test]
    fn rewrite_output_lines() {
        let result = Rewritten {
            html: String::new(),
            pictures: 5,
            vectors: 2,
        };
        let lines = format_rewrite_output(&result, Path::new("dist/index.html"));
        assert_eq!(lines[0], "  Written dist/index.html");
        assert_eq!(lines[1], "  Replaced 5 <img> tags with <picture> elements");
        assert_eq!(lines[2], "  Hashed 2 SVG references");
    }

    #[test]
    fn clean_output_line() {
        assert_eq!(format_clean_output(Path::new("dist")), vec!["  Cleaned dist/"]);
    }
}
