//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Sample** | `image` decode + Lanczos3 resize to RGBA8 |
//! | **Placeholder** | BlurHash encoder in [`blurhash`] |
//! | **Compress** | `image` JPEG / PNG encoders |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for layout scale factors and sample sizes
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
pub mod blurhash;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, PixelSample};
pub use calculations::{SCALE_RANGE, ScaleFactors, sample_dimensions, scale_factors};
pub use operations::{HashedPhoto, PlaceholderSettings, compress_photo, hash_photo};
pub use params::{CompressFormat, CompressParams, Quality, SampleParams};
pub use rust_backend::RustBackend;
