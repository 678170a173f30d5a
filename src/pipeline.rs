//! End-to-end runs: the stages wired together.
//!
//! ```text
//! sync     source/ ──reconcile──▶ delete stale ──▶ compress additions ──▶ published/
//! process  published/ ──candidates──▶ hash (cached) ──▶ manifest + keep-file
//! build    sync, then process
//! ```
//!
//! Each function takes the loaded [`ProjectConfig`] and its resolved
//! [`ProjectPaths`], so the CLI and the integration tests drive exactly the
//! same code.

use crate::cache::JsonCacheStore;
use crate::compress::{CompressError, CompressReport, compress_additions};
use crate::config::{ConfigError, ProjectConfig, ProjectPaths, effective_concurrency};
use crate::imaging::{ImageBackend, PlaceholderSettings, Quality};
use crate::manifest::{self, ManifestError, PhotoUrls, UrlMode};
use crate::process::{self, ProcessConfig, ProcessError, ProcessEvent, ProcessResult};
use crate::reconcile::{self, ReconcileError, Reconciliation};
use std::path::Path;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Compress(#[from] CompressError),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("Failed to write manifest: {0}")]
    Manifest(#[from] ManifestError),
    #[error("Could not start compression workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// What a sync run changed on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// The published directory did not exist and was created.
    pub created_published_dir: bool,
    /// Published names removed because their source is gone.
    pub deleted: Vec<String>,
    pub compress: CompressReport,
}

/// Diff source against published without touching disk.
///
/// A missing published directory counts as empty.
pub fn plan(config: &ProjectConfig, paths: &ProjectPaths) -> Result<Reconciliation, PipelineError> {
    let source = reconcile::list_names(&paths.source_dir, &config.ignore)?;
    let published = if paths.published_dir.is_dir() {
        reconcile::list_names(&paths.published_dir, &config.ignore)?
    } else {
        Vec::new()
    };
    Ok(reconcile::reconcile(&source, &published, &config.ignore))
}

/// Bring the published directory in line with the source directory.
///
/// Partial output from an interrupted run is cleared and stale photos are
/// deleted first (best effort), then additions are compressed. Compression
/// runs on a pool capped at the effective concurrency and stops at the first
/// failure.
pub fn sync(
    backend: &impl ImageBackend,
    config: &ProjectConfig,
    paths: &ProjectPaths,
) -> Result<SyncOutcome, PipelineError> {
    let created_published_dir = reconcile::ensure_dir(&paths.published_dir)?;
    let stale = reconcile::clear_partials(&paths.published_dir)?;
    if stale > 0 {
        tracing::info!(stale, "removed partial output from an interrupted run");
    }
    let plan = plan(config, paths)?;

    let removed = reconcile::apply_deletions(&paths.published_dir, &plan.deletions);
    tracing::info!(
        planned = plan.deletions.len(),
        removed,
        "removed photos without a source"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(effective_concurrency(&config.processing))
        .build()?;
    let quality = Quality::new(config.compression.quality);
    let compress = pool.install(|| {
        compress_additions(
            backend,
            &paths.source_dir,
            &paths.published_dir,
            &plan.additions,
            quality,
        )
    })?;

    Ok(SyncOutcome {
        created_published_dir,
        deleted: plan.deletions,
        compress,
    })
}

/// Settings for the hash stage derived from project config and URL mode.
pub fn process_config(config: &ProjectConfig, mode: UrlMode) -> ProcessConfig {
    let [x, y] = config.placeholder.components;
    ProcessConfig {
        concurrency: effective_concurrency(&config.processing),
        persist_every: config.processing.persist_every,
        placeholder: PlaceholderSettings {
            components: (x, y),
            sample_divisor: config.placeholder.sample_divisor,
        },
        urls: PhotoUrls {
            mode,
            local_prefix: config.urls.local_prefix.clone(),
            cdn: config.urls.cdn.clone(),
        },
    }
}

/// Hash every published photo and write the manifest.
///
/// The published directory must exist; a missing one is a listing error.
pub fn publish_manifest(
    backend: &impl ImageBackend,
    config: &ProjectConfig,
    paths: &ProjectPaths,
    mode: UrlMode,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, PipelineError> {
    let candidates = reconcile::list_candidates(&paths.published_dir, &config.ignore)?;
    let mut store = JsonCacheStore::load(&paths.cache_file);
    let result = process::process(
        backend,
        &mut store,
        &paths.published_dir,
        &candidates,
        &process_config(config, mode),
        events,
    )?;
    write_outputs(&paths.manifest_file, &paths.published_dir, &result)?;
    Ok(result)
}

fn write_outputs(
    manifest_file: &Path,
    published_dir: &Path,
    result: &ProcessResult,
) -> Result<(), ManifestError> {
    manifest::write_manifest(manifest_file, &result.photos)?;
    manifest::ensure_keep_file(published_dir)?;
    tracing::info!(
        photos = result.photos.len(),
        path = %manifest_file.display(),
        "manifest written"
    );
    Ok(())
}

/// Full run: [`sync`] then [`publish_manifest`].
pub fn build(
    backend: &impl ImageBackend,
    config: &ProjectConfig,
    paths: &ProjectPaths,
    mode: UrlMode,
    events: Option<Sender<ProcessEvent>>,
) -> Result<(SyncOutcome, ProcessResult), PipelineError> {
    let synced = sync(backend, config, paths)?;
    let processed = publish_manifest(backend, config, paths, mode, events)?;
    Ok((synced, processed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::manifest::{KEEP_FILE, PhotoDescriptor};
    use std::fs;
    use tempfile::TempDir;

    fn project(tmp: &TempDir) -> (ProjectConfig, ProjectPaths) {
        let config = ProjectConfig::default();
        let paths = config.resolve(tmp.path());
        fs::create_dir_all(&paths.source_dir).unwrap();
        (config, paths)
    }

    fn touch(dir: &Path, name: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), "x").unwrap();
    }

    fn read_manifest(paths: &ProjectPaths) -> Vec<PhotoDescriptor> {
        serde_json::from_str(&fs::read_to_string(&paths.manifest_file).unwrap()).unwrap()
    }

    // =========================================================================
    // plan / sync
    // =========================================================================

    #[test]
    fn plan_treats_missing_published_as_empty() {
        let tmp = TempDir::new().unwrap();
        let (config, paths) = project(&tmp);
        touch(&paths.source_dir, "a.jpg");

        let plan = plan(&config, &paths).unwrap();
        assert_eq!(plan.additions, vec!["a.jpg"]);
        assert!(!paths.published_dir.exists());
    }

    #[test]
    fn plan_missing_source_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let config = ProjectConfig::default();
        let paths = config.resolve(tmp.path());
        assert!(matches!(
            plan(&config, &paths),
            Err(PipelineError::Reconcile(ReconcileError::Listing { .. }))
        ));
    }

    #[test]
    fn sync_deletes_and_compresses() {
        let tmp = TempDir::new().unwrap();
        let (config, paths) = project(&tmp);
        touch(&paths.source_dir, "keep.jpg");
        touch(&paths.source_dir, "new.png");
        touch(&paths.source_dir, "clip.gif");
        touch(&paths.published_dir, "keep.jpg");
        touch(&paths.published_dir, "gone.jpg");
        let backend = MockBackend::new();

        let outcome = sync(&backend, &config, &paths).unwrap();

        assert!(!outcome.created_published_dir);
        assert_eq!(outcome.deleted, vec!["gone.jpg"]);
        assert_eq!(outcome.compress.compressed, vec!["new.png"]);
        assert_eq!(outcome.compress.skipped, vec!["clip.gif"]);
        assert!(!paths.published_dir.join("gone.jpg").exists());
        assert!(paths.published_dir.join("new.png").exists());
        assert!(!paths.published_dir.join("clip.gif").exists());
    }

    #[test]
    fn sync_clears_interrupted_output() {
        let tmp = TempDir::new().unwrap();
        let (config, paths) = project(&tmp);
        touch(&paths.source_dir, "a.jpg");
        touch(&paths.published_dir, &crate::naming::partial_name("a.jpg"));

        let outcome = sync(&MockBackend::new(), &config, &paths).unwrap();

        assert!(outcome.deleted.is_empty());
        assert_eq!(outcome.compress.compressed, vec!["a.jpg"]);
        assert!(!paths.published_dir.join(".a.jpg.partial").exists());
    }

    #[test]
    fn sync_creates_published_dir() {
        let tmp = TempDir::new().unwrap();
        let (config, paths) = project(&tmp);
        touch(&paths.source_dir, "a.jpg");

        let outcome = sync(&MockBackend::new(), &config, &paths).unwrap();
        assert!(outcome.created_published_dir);
        assert!(paths.published_dir.join("a.jpg").exists());
    }

    #[test]
    fn sync_compression_failure_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let (config, paths) = project(&tmp);
        touch(&paths.source_dir, "bad.jpg");
        let backend = MockBackend::new().failing("bad.jpg");

        assert!(matches!(
            sync(&backend, &config, &paths),
            Err(PipelineError::Compress(_))
        ));
    }

    // =========================================================================
    // publish_manifest
    // =========================================================================

    #[test]
    fn publish_writes_manifest_cache_and_keep_file() {
        let tmp = TempDir::new().unwrap();
        let (config, paths) = project(&tmp);
        touch(&paths.published_dir, "a.jpg");
        let backend = MockBackend::new().with_photo("a.jpg", 1000, 400);

        let result = publish_manifest(&backend, &config, &paths, UrlMode::Dev, None).unwrap();

        assert_eq!(result.photos.len(), 1);
        assert_eq!(read_manifest(&paths), result.photos);
        assert_eq!(result.photos[0].src, "./photos/a.jpg");
        assert!(paths.cache_file.exists());
        assert!(paths.published_dir.join(KEEP_FILE).exists());
    }

    #[test]
    fn publish_excludes_failures_from_manifest() {
        let tmp = TempDir::new().unwrap();
        let (config, paths) = project(&tmp);
        touch(&paths.published_dir, "a.jpg");
        touch(&paths.published_dir, "notes.txt");
        let backend = MockBackend::new().with_photo("a.jpg", 100, 100);

        let result = publish_manifest(&backend, &config, &paths, UrlMode::Remote, None).unwrap();

        assert_eq!(result.stats.failed, 1);
        let manifest = read_manifest(&paths);
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest[0].title, "a");
    }

    #[test]
    fn process_config_maps_project_settings() {
        let mut config = ProjectConfig::default();
        config.placeholder.components = [3, 5];
        config.urls.cdn = "https://cdn/".into();
        let pc = process_config(&config, UrlMode::Remote);
        assert_eq!(pc.placeholder.components, (3, 5));
        assert_eq!(pc.persist_every, 10);
        assert!(pc.concurrency >= 1);
        assert_eq!(pc.urls.src("a.jpg"), "https://cdn/a.jpg");
    }

    #[test]
    fn build_runs_both_stages() {
        let tmp = TempDir::new().unwrap();
        let (config, paths) = project(&tmp);
        touch(&paths.source_dir, "a.jpg");
        let backend = MockBackend::new().with_photo("a.jpg", 640, 480);

        let (synced, processed) = build(&backend, &config, &paths, UrlMode::Dev, None).unwrap();

        assert_eq!(synced.compress.compressed, vec!["a.jpg"]);
        assert_eq!(processed.photos.len(), 1);
        assert_eq!(read_manifest(&paths)[0].size.width, 640);
    }
}
