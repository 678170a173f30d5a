//! Project configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the project root (the `--root` directory) and is sparse: stock defaults are
//! overridden key by key, so a project only states what differs.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! source_dir = "photos"               # Source images (relative to root)
//! published_dir = "public/photos"     # Published, compressed images
//! cache_file = "blurhash_cache.json"  # Placeholder cache
//! manifest_file = "src/photos.json"   # Manifest consumed by the front end
//! ignore = [".DS_Store", "hidden"]    # Names containing any of these are skipped
//!
//! [urls]
//! local_prefix = "./photos/"          # `src` prefix in DEV mode
//! cdn = ""                            # `src` prefix in every other mode
//!
//! [compression]
//! quality = 80                        # JPEG quality (1-100)
//!
//! [placeholder]
//! components = [4, 4]                 # BlurHash detail grid, x then y (1-9)
//! sample_divisor = 4                  # Down-sample factor before hashing
//!
//! [processing]
//! max_processes = 4                   # Max parallel workers (omit for auto = cores - 1)
//! persist_every = 10                  # Resolved photos between cache writes
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the project root.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `config.toml`.
///
/// All directory and file paths are relative to the project root; use
/// [`ProjectConfig::resolve`] to turn them into [`ProjectPaths`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Directory holding the original photos.
    pub source_dir: String,
    /// Directory the compressed photos are published to.
    pub published_dir: String,
    /// JSON file backing the placeholder cache.
    pub cache_file: String,
    /// JSON manifest written for the gallery front end.
    pub manifest_file: String,
    /// Substrings; any file name containing one of them is ignored.
    pub ignore: Vec<String>,
    /// URL prefixes for the manifest `src` field.
    pub urls: UrlsConfig,
    /// Re-encoding settings for newly added photos.
    pub compression: CompressionConfig,
    /// Placeholder hash settings.
    pub placeholder: PlaceholderConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            source_dir: "photos".to_string(),
            published_dir: "public/photos".to_string(),
            cache_file: "blurhash_cache.json".to_string(),
            manifest_file: "src/photos.json".to_string(),
            ignore: vec![".DS_Store".to_string(), "hidden".to_string()],
            urls: UrlsConfig::default(),
            compression: CompressionConfig::default(),
            placeholder: PlaceholderConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.compression.quality) {
            return Err(ConfigError::Validation(
                "compression.quality must be 1-100".into(),
            ));
        }
        let [x, y] = self.placeholder.components;
        if !(1..=9).contains(&x) || !(1..=9).contains(&y) {
            return Err(ConfigError::Validation(
                "placeholder.components values must be 1-9".into(),
            ));
        }
        if self.placeholder.sample_divisor == 0 {
            return Err(ConfigError::Validation(
                "placeholder.sample_divisor must be non-zero".into(),
            ));
        }
        if self.processing.persist_every == 0 {
            return Err(ConfigError::Validation(
                "processing.persist_every must be non-zero".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be non-zero".into(),
            ));
        }
        if self.source_dir == self.published_dir {
            return Err(ConfigError::Validation(
                "source_dir and published_dir must differ".into(),
            ));
        }
        Ok(())
    }

    /// Resolve the configured paths against the project root.
    pub fn resolve(&self, root: &Path) -> ProjectPaths {
        ProjectPaths {
            source_dir: root.join(&self.source_dir),
            published_dir: root.join(&self.published_dir),
            cache_file: root.join(&self.cache_file),
            manifest_file: root.join(&self.manifest_file),
        }
    }
}

/// Absolute (root-joined) locations of everything the pipeline touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub source_dir: PathBuf,
    pub published_dir: PathBuf,
    pub cache_file: PathBuf,
    pub manifest_file: PathBuf,
}

/// URL prefixes joined with the file name to build a photo's `src`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UrlsConfig {
    pub local_prefix: String,
    pub cdn: String,
}

impl Default for UrlsConfig {
    fn default() -> Self {
        Self {
            local_prefix: "./photos/".to_string(),
            cdn: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    /// JPEG quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self { quality: 80 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceholderConfig {
    /// BlurHash components as `[x, y]`.
    pub components: [u32; 2],
    /// Each source dimension is divided by this before hashing.
    pub sample_divisor: u32,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            components: [4, 4],
            sample_divisor: 4,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel hash workers.
    /// When absent, defaults to one less than the number of CPU cores.
    /// Values larger than that are clamped down.
    pub max_processes: Option<usize>,
    /// Number of freshly resolved photos between cache persists.
    pub persist_every: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_processes: None,
            persist_every: 10,
        }
    }
}

/// Resolve the effective worker count from config.
///
/// - `None` → `max(1, cores - 1)`, leaving a core for the orchestrator
/// - `Some(n)` → `n` clamped into `1..=auto` (user can constrain down, not up)
pub fn effective_concurrency(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let auto = cores.saturating_sub(1).max(1);
    config
        .max_processes
        .map(|n| n.clamp(1, auto))
        .unwrap_or(auto)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(ProjectConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key by key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut table), toml::Value::Table(overrides)) => {
            for (key, value) in overrides {
                let merged = match table.remove(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => value,
                };
                table.insert(key, merged);
            }
            toml::Value::Table(table)
        }
        (_, overlay) => overlay,
    }
}

/// Read `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no config file.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let path = root.join(CONFIG_FILENAME);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    Ok(Some(toml::from_str(&content)?))
}

/// Load config from the project root: user values over stock defaults,
/// unknown keys rejected, result validated.
pub fn load_config(root: &Path) -> Result<ProjectConfig, ConfigError> {
    let merged = match load_raw_config(root)? {
        Some(overlay) => merge_toml(stock_defaults_value()?, overlay),
        None => stock_defaults_value()?,
    };
    let config: ProjectConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# photo-manifest configuration
# ============================
#
# Every key is optional; the values below are the stock defaults.
# Paths are relative to the directory holding this file.

# Original photos. Anything added here is compressed into published_dir.
source_dir = "photos"

# Published photos. Files no longer present in source_dir are deleted.
published_dir = "public/photos"

# Placeholder cache, keyed by file name. Delete it to recompute everything.
cache_file = "blurhash_cache.json"

# Manifest consumed by the gallery front end. Rewritten on every run.
manifest_file = "src/photos.json"

# File names containing any of these substrings are ignored.
ignore = [".DS_Store", "hidden"]

[urls]
# Prefix for each photo's src when GALLERY_ENV=DEV.
local_prefix = "./photos/"
# Prefix for each photo's src in every other mode.
cdn = ""

[compression]
# JPEG re-encoding quality, 1-100. PNG files are re-encoded losslessly.
quality = 80

[placeholder]
# BlurHash detail grid as [x, y]; each value 1-9.
components = [4, 4]
# Photos are shrunk by this factor per dimension before hashing.
sample_divisor = 4

[processing]
# Maximum parallel hash workers. Omit for one less than the CPU core count.
# max_processes = 4
# Write the cache after this many newly hashed photos.
persist_every = 10
"##
}
