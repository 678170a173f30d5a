//! The photo manifest consumed by the gallery front end.
//!
//! The manifest is a compact JSON array, one [`PhotoDescriptor`] per resolved
//! photo, in candidate order (newest first):
//!
//! ```json
//! [{"src":"https://cdn.example.com/sunset.jpg","title":"sunset","alt":"sunset",
//!   "width":33,"height":25,"size":{"height":3000,"width":4000},"hash":"U5F~..."}]
//! ```
//!
//! `width`/`height` are layout scale factors, `size` carries the true pixel
//! dimensions. Descriptors are rebuilt from cache entries on every run and the
//! file is always overwritten, never merged.

use crate::cache::CacheEntry;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Zero-byte sentinel kept in the published directory so it survives even
/// when empty.
pub const KEEP_FILE: &str = ".gitkeep";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which prefix `src` URLs are built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrlMode {
    /// Local development: relative path served by the dev server.
    Dev,
    /// Anything else: the configured CDN base.
    #[default]
    Remote,
}

impl UrlMode {
    /// Interpret an environment value. Only the exact string `DEV` selects
    /// [`UrlMode::Dev`].
    pub fn from_env_value(value: &str) -> Self {
        if value == "DEV" { Self::Dev } else { Self::Remote }
    }
}

/// Builds `src` URLs for published photos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUrls {
    pub mode: UrlMode,
    pub local_prefix: String,
    pub cdn: String,
}

impl PhotoUrls {
    pub fn src(&self, file_name: &str) -> String {
        let prefix = match self.mode {
            UrlMode::Dev => &self.local_prefix,
            UrlMode::Remote => &self.cdn,
        };
        format!("{prefix}{file_name}")
    }
}

/// True pixel dimensions. Serialized height first, matching manifests the
/// front end already ships.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Size {
    pub height: u32,
    pub width: u32,
}

/// One manifest entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhotoDescriptor {
    pub src: String,
    pub title: String,
    pub alt: String,
    /// Width scale factor.
    pub width: u32,
    /// Height scale factor.
    pub height: u32,
    pub size: Size,
    pub hash: String,
}

impl PhotoDescriptor {
    pub fn from_entry(file_name: &str, entry: &CacheEntry, urls: &PhotoUrls) -> Self {
        Self {
            src: urls.src(file_name),
            title: entry.name.clone(),
            alt: entry.name.clone(),
            width: entry.width_scale,
            height: entry.height_scale,
            size: Size {
                width: entry.width,
                height: entry.height,
            },
            hash: entry.hash.clone(),
        }
    }
}

/// Overwrite the manifest at `path`, creating parent directories.
pub fn write_manifest(path: &Path, photos: &[PhotoDescriptor]) -> Result<(), ManifestError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string(photos)?;
    fs::write(path, json)?;
    Ok(())
}

/// Make sure the published directory holds the keep-file sentinel.
pub fn ensure_keep_file(dir: &Path) -> Result<(), ManifestError> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(KEEP_FILE), "")?;
    Ok(())
}
