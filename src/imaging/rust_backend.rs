//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only, no decode) |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` |
//! | Sample | `DynamicImage::resize` with `Lanczos3`, then `to_rgba8` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the configured quality |
//! | Encode → PNG | `image::codecs::png::PngEncoder`, best compression, adaptive filter |

use super::backend::{BackendError, Dimensions, ImageBackend, PixelSample};
use super::params::{CompressFormat, CompressParams, SampleParams};
use crate::naming;
use image::DynamicImage;
use image::ImageReader;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, PngEncoder};
use image::imageops::FilterType;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Pure Rust backend using the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk, sniffing the format from its bytes.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Sibling path the encoder writes to before the final rename.
///
/// A half-written photo must never appear under its real name, or the next
/// run would treat it as already published.
fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(naming::partial_name(&name))
}

fn encode(img: &DynamicImage, path: &Path, params: &CompressParams) -> Result<(), BackendError> {
    let writer = BufWriter::new(std::fs::File::create(path)?);
    let result = match params.format {
        CompressFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(writer, params.quality.value() as u8);
            rgb.write_with_encoder(encoder)
        }
        CompressFormat::Png => {
            let encoder = PngEncoder::new_with_quality(
                writer,
                CompressionType::Best,
                image::codecs::png::FilterType::Adaptive,
            );
            img.write_with_encoder(encoder)
        }
    };
    result.map_err(|e| {
        BackendError::ProcessingFailed(format!("Encoding {} failed: {}", path.display(), e))
    })
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to read dimensions of {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Dimensions { width, height })
    }

    fn sample(&self, params: &SampleParams) -> Result<PixelSample, BackendError> {
        let img = load_image(&params.source)?;
        let small = img.resize(params.width, params.height, FilterType::Lanczos3);
        let rgba = small.to_rgba8();
        Ok(PixelSample {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        })
    }

    fn compress(&self, params: &CompressParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let partial = partial_path(&params.output);
        if let Err(e) = encode(&img, &partial, params) {
            if let Err(cleanup) = std::fs::remove_file(&partial) {
                tracing::debug!(path = %partial.display(), error = %cleanup, "partial output not removed");
            }
            return Err(e);
        }
        std::fs::rename(&partial, &params.output)?;
        Ok(())
    }
}
