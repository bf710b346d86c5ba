//! Image codec layer, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` → RGBA8 |
//! | **Resize** | Lanczos3 via `image::imageops::resize` |
//! | **Encode** | AVIF (rav1e), lossless WebP, indexed PNG (`png` + `color_quant`) |
//! | **Identify** | dimensions read back from an encoded buffer |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{size_tag, target_dimensions};
pub use operations::{
    EncodedSizes, EncodedVariant, GeneratedVariant, create_variant, encode_variant, write_variant,
};
pub use params::{EncodeSettings, OutputFormat, Quality, ResizeTarget};
pub use rust_backend::RustBackend;
