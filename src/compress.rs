//! Compression of newly added photos into the published directory.
//!
//! Each addition is re-encoded according to its extension:
//!
//! | Extension | Output |
//! |---|---|
//! | `.jpg`, `.jpeg` | JPEG at the configured quality (default 80) |
//! | `.png` | PNG, best compression |
//! | anything else | **skipped**, reported with a warning |
//!
//! Skipped files are not copied, so they never reach the published directory
//! and never appear in the manifest.
//!
//! Unlike the hash stage, compression is all-or-nothing: the first failure
//! aborts the step and the run. Photos compressed before the failure stay
//! published and are not redone next time.

use crate::imaging::{BackendError, CompressFormat, ImageBackend, Quality, compress_photo};
use rayon::prelude::*;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Failed to compress {file}: {source}")]
    Imaging {
        file: String,
        #[source]
        source: BackendError,
    },
}

/// Outcome of compressing one batch of additions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressReport {
    /// Photos written to the published directory.
    pub compressed: Vec<String>,
    /// Photos left out because their format has no re-encoding policy.
    pub skipped: Vec<String>,
}

/// Compress `additions` from `source_dir` into `published_dir`, in parallel
/// on the current rayon pool.
pub fn compress_additions(
    backend: &impl ImageBackend,
    source_dir: &Path,
    published_dir: &Path,
    additions: &[String],
    quality: Quality,
) -> Result<CompressReport, CompressError> {
    let mut report = CompressReport::default();
    let mut work = Vec::new();
    for name in additions {
        match CompressFormat::from_filename(name) {
            Some(format) => work.push((name, format)),
            None => {
                tracing::warn!(file = %name, "no compression policy for this format, skipping");
                report.skipped.push(name.clone());
            }
        }
    }

    work.par_iter()
        .try_for_each(|(name, format)| {
            compress_photo(
                backend,
                &source_dir.join(name),
                published_dir,
                *format,
                quality,
            )
            .map_err(|source| CompressError::Imaging {
                file: (*name).clone(),
                source,
            })
        })?;

    report.compressed = work.into_iter().map(|(name, _)| name.clone()).collect();
    Ok(report)
}
