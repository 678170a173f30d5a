//! High-level image operations.
//!
//! These functions combine calculations with backend execution. They take
//! configuration, compute parameters, and call the backend.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::blurhash;
use super::calculations::sample_dimensions;
use super::params::{CompressFormat, CompressParams, Quality, SampleParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// How placeholders are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderSettings {
    /// BlurHash grid as `(x, y)`.
    pub components: (u32, u32),
    /// Down-sample factor applied to each source dimension.
    pub sample_divisor: u32,
}

impl Default for PlaceholderSettings {
    fn default() -> Self {
        Self {
            components: (4, 4),
            sample_divisor: 4,
        }
    }
}

/// A photo's true dimensions plus its placeholder hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedPhoto {
    pub dimensions: Dimensions,
    pub hash: String,
}

/// Compute the placeholder for one photo.
///
/// Probes true dimensions, reads a down-sampled copy roughly
/// `1 / sample_divisor` the size in each dimension, and encodes it.
pub fn hash_photo(
    backend: &impl ImageBackend,
    path: &Path,
    settings: &PlaceholderSettings,
) -> Result<HashedPhoto> {
    let dimensions = backend.identify(path)?;
    let (width, height) = sample_dimensions(
        (dimensions.width, dimensions.height),
        settings.sample_divisor,
    );
    let sample = backend.sample(&SampleParams {
        source: path.to_path_buf(),
        width,
        height,
    })?;
    let hash = blurhash::encode(
        &sample.rgba,
        sample.width,
        sample.height,
        settings.components,
    )?;
    Ok(HashedPhoto { dimensions, hash })
}

/// Re-encode one photo into `output_dir`, keeping its file name.
pub fn compress_photo(
    backend: &impl ImageBackend,
    source: &Path,
    output_dir: &Path,
    format: CompressFormat,
    quality: Quality,
) -> Result<()> {
    let file_name = source.file_name().ok_or_else(|| {
        BackendError::ProcessingFailed(format!("{} has no file name", source.display()))
    })?;
    backend.compress(&CompressParams {
        source: source.to_path_buf(),
        output: output_dir.join(file_name),
        format,
        quality,
    })
}
