//! # Photo Manifest
//!
//! Build-time asset pipeline for a photo gallery site. Originals live in a
//! source directory; the tool mirrors them into a published directory as
//! compressed copies and writes a JSON manifest the front end renders from.
//! Every manifest entry carries a compact BlurHash placeholder and layout
//! scale factors, so the gallery can lay out and blur-fill tiles before any
//! photo has loaded.
//!
//! # Architecture: Two Stages
//!
//! ```text
//! 1. Sync      photos/         →  public/photos/     (delete stale, compress new)
//! 2. Process   public/photos/  →  src/photos.json    (placeholders, cached by file name)
//! ```
//!
//! Stage 2 reads the *published* directory, not the source, so the manifest
//! always describes exactly what is deployed. `build` runs both.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Wires the stages together; what the CLI calls |
//! | [`reconcile`] | Source/published diff, listings, deletions, newest-first ordering |
//! | [`compress`] | Re-encodes additions (JPEG quality 80, lossless PNG) |
//! | [`process`] | Batched, bounded-parallel placeholder computation with failure isolation |
//! | [`cache`] | Placeholder cache: `CacheStore` trait, JSON store, run statistics |
//! | [`manifest`] | Manifest entries, `src` URL mode, manifest and keep-file writers |
//! | [`imaging`] | Pure-Rust image backend, scale-factor math, BlurHash encoder |
//! | [`config`] | Sparse `config.toml` over stock defaults, validation, concurrency |
//! | [`naming`] | Ignore-list matching, titles, extensions |
//! | [`output`] | CLI output formatting for progress events and reports |
//!
//! # Design Decisions
//!
//! ## Single Writer Cache
//!
//! Hash workers never touch the cache. They return results to the
//! orchestrator, which is the only code that writes the [`cache::CacheStore`].
//! The store therefore needs no locking and the on-disk file is always a
//! complete snapshot.
//!
//! ## Failures Are Per Photo
//!
//! A photo that cannot be decoded is logged and left out of the manifest; it
//! is retried on the next run. Only infrastructure problems (unreadable
//! directories, an unwritable manifest or cache, a failed compression) stop a
//! run.
//!
//! ## Deterministic Output
//!
//! The manifest follows candidate order, never completion order, and the
//! cache file is written from a sorted map. Re-running with no changes
//! produces byte-identical files.

pub mod cache;
pub mod compress;
pub mod config;
pub mod imaging;
pub mod manifest;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod reconcile;

/// Install the global `tracing` subscriber.
///
/// Diagnostics go to stderr at `warn` unless `RUST_LOG` says otherwise.
/// Calling it twice is harmless; the second call is ignored.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}
