//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::ResizeTarget;

/// Calculate output dimensions for a single-axis resize.
///
/// The constrained axis takes the requested size exactly; the other axis is
/// scaled to preserve the source aspect ratio, rounded to the nearest pixel
/// and never less than 1. Upscaling is allowed.
///
/// # Examples
/// ```
/// # use asset_press::imaging::{ResizeTarget, target_dimensions};
/// assert_eq!(target_dimensions((2400, 1800), ResizeTarget::Width(400)), (400, 300));
/// assert_eq!(target_dimensions((1000, 500), ResizeTarget::Height(176)), (352, 176));
/// ```
pub fn target_dimensions(source: (u32, u32), target: ResizeTarget) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (src_w, src_h) = (src_w.max(1) as f64, src_h.max(1) as f64);

    match target {
        ResizeTarget::Width(w) => {
            let h = (w as f64 * src_h / src_w).round() as u32;
            (w, h.max(1))
        }
        ResizeTarget::Height(h) => {
            let w = (h as f64 * src_w / src_h).round() as u32;
            (w.max(1), h)
        }
    }
}

/// Format a size tag (`WxH`) for multi-width filenames.
pub fn size_tag(width: u32, height: u32) -> String {
    format!("{width}x{height}")
}
