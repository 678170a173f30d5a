//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! and the [`backend`](super::backend), which does the actual pixel work. The
//! split lets tests swap in a mock backend without touching operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 80). Clamped on construction.
//! - [`CompressFormat`]: Re-encoding policy chosen from the file extension.
//! - [`CompressParams`]: Source, output path, format and quality for one re-encode.
//! - [`SampleParams`]: Source and bounding box for a down-sampled pixel read.

use crate::naming;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Output encoding for a published photo.
///
/// Only formats with a defined re-encoding policy appear here; everything
/// else is skipped by the compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressFormat {
    /// Lossy JPEG at the configured quality.
    Jpeg,
    /// Lossless PNG at maximum compression effort.
    Png,
}

impl CompressFormat {
    pub fn from_filename(name: &str) -> Option<Self> {
        match naming::extension(name)?.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }
}

/// Parameters for re-encoding a source photo into the published directory.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub format: CompressFormat,
    pub quality: Quality,
}

/// Parameters for reading a down-sampled copy of a photo.
///
/// The result fits inside `width × height` with the aspect ratio preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleParams {
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_80() {
        assert_eq!(Quality::default().value(), 80);
    }

    #[test]
    fn format_from_jpeg_extensions() {
        assert_eq!(CompressFormat::from_filename("a.jpg"), Some(CompressFormat::Jpeg));
        assert_eq!(CompressFormat::from_filename("a.JPEG"), Some(CompressFormat::Jpeg));
    }

    #[test]
    fn format_from_png_extension() {
        assert_eq!(CompressFormat::from_filename("a.png"), Some(CompressFormat::Png));
    }

    #[test]
    fn format_unsupported_extensions() {
        assert_eq!(CompressFormat::from_filename("a.gif"), None);
        assert_eq!(CompressFormat::from_filename("a.webp"), None);
        assert_eq!(CompressFormat::from_filename("noext"), None);
    }
}
