//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the pipeline needs:
//! identify, sample, and compress. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend); tests use the recording
//! [`MockBackend`](tests::MockBackend).

use super::params::{CompressParams, SampleParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Down-sampled pixels, row-major RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSample {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Trait for image processing backends.
///
/// `Sync` is required because the hash worker pool shares one backend across
/// all of its threads.
pub trait ImageBackend: Sync {
    /// Get true pixel dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode and shrink an image to fit the requested box.
    fn sample(&self, params: &SampleParams) -> Result<PixelSample, BackendError>;

    /// Re-encode an image into its published form.
    fn compress(&self, params: &CompressParams) -> Result<(), BackendError>;
}
