//! Placeholder cache for incremental runs.
//!
//! Computing a BlurHash means decoding every photo, which dominates the run
//! time of the tool. This module remembers the result per photo so a re-run
//! only decodes photos it has never seen.
//!
//! # Design
//!
//! ## Cache keys
//!
//! The cache is keyed by **file name only**. A photo replaced in place under
//! the same name keeps its old entry; delete the entry (or the whole cache
//! file) to force a recompute. Entries for photos that were since removed are
//! never pruned. They cost a few bytes and are harmless because lookups only
//! happen for names that are currently published.
//!
//! ## Access
//!
//! The [`CacheStore`] trait is the only way the rest of the crate reaches the
//! cache: `get`, `put`, `persist`. Nothing else reads or writes the cache file.
//! The orchestrator is the single writer, so the store needs no locking.
//!
//! ## Storage
//!
//! [`JsonCacheStore`] keeps a plain JSON object mapping file name to entry,
//! the same shape existing gallery caches already use:
//!
//! ```json
//! {
//!   "sunset.jpg": {
//!     "name": "sunset", "width": 4000, "height": 3000,
//!     "widthScale": 33, "heightScale": 25, "hash": "U5F~..."
//!   }
//! }
//! ```
//!
//! Entries live in a `BTreeMap`, so a persist with unchanged contents writes
//! byte-identical output. Every persist rewrites the whole file.
//!
//! A missing, unreadable or malformed file loads as an empty cache with a
//! warning. The run then recomputes everything instead of failing.

use crate::imaging::{Dimensions, scale_factors};
use crate::naming;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Last successfully computed result for one photo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Display name: file name without its extension.
    pub name: String,
    /// True pixel width.
    pub width: u32,
    /// True pixel height.
    pub height: u32,
    pub width_scale: u32,
    pub height_scale: u32,
    /// BlurHash placeholder.
    pub hash: String,
}

impl CacheEntry {
    /// Build an entry from a freshly hashed photo, deriving name and scale factors.
    pub fn new(file_name: &str, dimensions: Dimensions, hash: String) -> Self {
        let scale = scale_factors(dimensions.width, dimensions.height);
        Self {
            name: naming::photo_title(file_name).to_string(),
            width: dimensions.width,
            height: dimensions.height,
            width_scale: scale.width,
            height_scale: scale.height,
            hash,
        }
    }
}

/// Keyed access to cached placeholder results.
///
/// Implementations own their persistence; callers only decide *when* to
/// persist.
pub trait CacheStore {
    /// Look up the entry for a file name.
    fn get(&self, key: &str) -> Option<&CacheEntry>;

    /// Insert or overwrite the entry for a file name.
    fn put(&mut self, key: String, entry: CacheEntry);

    /// Write the full contents to durable storage.
    fn persist(&mut self) -> io::Result<()>;

    /// Number of entries currently held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// [`CacheStore`] backed by a single JSON file.
#[derive(Debug)]
pub struct JsonCacheStore {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
}

impl JsonCacheStore {
    /// Create an empty store that will persist to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Load from `path`. Never fails: any problem yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no cache file, starting cold");
                return Self::empty(path);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cache unreadable, starting cold");
                return Self::empty(path);
            }
        };
        let entries: BTreeMap<String, CacheEntry> = match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cache malformed, starting cold");
                return Self::empty(path);
            }
        };
        tracing::info!(entries = entries.len(), "loaded placeholder cache");
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStore for JsonCacheStore {
    fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    fn put(&mut self, key: String, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    fn persist(&mut self) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json)?;
        tracing::debug!(entries = self.entries.len(), path = %self.path.display(), "cache persisted");
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Summary of cache performance for a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub hashed: u32,
    pub failed: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn hash(&mut self) {
        self.hashed += 1;
    }

    pub fn fail(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.hashed + self.failed
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = if self.failed > 0 {
            format!(", {} failed", self.failed)
        } else {
            String::new()
        };
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} hashed{} ({} total)",
                self.hits,
                self.hashed,
                failed,
                self.total()
            )
        } else {
            write!(f, "{} hashed{}", self.hashed, failed)
        }
    }
}
