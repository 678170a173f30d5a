//! Placeholder computation for every published photo.
//!
//! Takes the ordered candidate list, resolves each photo from the cache or by
//! hashing it, and returns the manifest entries in candidate order.
//!
//! ## Batches
//!
//! Candidates are split into batches of `concurrency` photos. Batches run one
//! after another; within a batch:
//!
//! 1. Cache hits resolve immediately. No task is dispatched for them.
//! 2. Every miss becomes one task on a dedicated rayon pool of exactly
//!    `concurrency` threads, so at most that many photos decode at once.
//! 3. The orchestrator waits for *all* tasks of the batch. A failing or
//!    panicking task only loses its own photo.
//! 4. Results are merged on the calling thread, which is the only writer
//!    to the [`CacheStore`]. Tasks never see the store.
//!
//! ```text
//! Pending ──cache hit──────────────▶ Resolved
//! Pending ──miss──▶ Dispatched ──ok──▶ Resolved
//!                              └─err─▶ Rejected   (logged, left out, retried next run)
//! ```
//!
//! ## Persistence
//!
//! The store is persisted each time `persist_every` photos have been freshly
//! hashed since the last persist, and once more after the last batch. An
//! interrupted run loses at most that many results plus the in-flight batch.
//!
//! ## Ordering
//!
//! Each result is written to the slot of its candidate index, so the output
//! order never depends on which task finished first.
//!
//! There is no per-task timeout.

use crate::cache::{CacheEntry, CacheStats, CacheStore};
use crate::imaging::{BackendError, HashedPhoto, ImageBackend, PlaceholderSettings, hash_photo};
use crate::manifest::{PhotoDescriptor, PhotoUrls};
use rayon::prelude::*;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Cache persist failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not start hash workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Settings for one processing run.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// Batch size and worker count.
    pub concurrency: usize,
    /// Freshly hashed photos between cache persists.
    pub persist_every: usize,
    pub placeholder: PlaceholderSettings,
    pub urls: PhotoUrls,
}

/// Progress notifications, sent in the order things happen.
///
/// Positions are 1-based and count settled photos across the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Started {
        total: usize,
        cached: usize,
        concurrency: usize,
    },
    BatchStarted {
        batch: usize,
        size: usize,
    },
    ItemResolved {
        position: usize,
        total: usize,
        name: String,
        cached: bool,
    },
    ItemFailed {
        position: usize,
        total: usize,
        name: String,
        message: String,
    },
    BatchFinished {
        processed: usize,
        total: usize,
    },
    CachePersisted {
        entries: usize,
    },
}

/// Resolved photos in candidate order plus cache statistics.
#[derive(Debug)]
pub struct ProcessResult {
    pub photos: Vec<PhotoDescriptor>,
    pub stats: CacheStats,
}

/// Resolve every candidate in `photos_dir`, hashing cache misses.
///
/// Per-photo failures are absorbed (logged, reported, left out). Only a
/// failure to persist the cache or to start the worker pool is an error.
pub fn process<S, B>(
    backend: &B,
    store: &mut S,
    photos_dir: &Path,
    candidates: &[String],
    config: &ProcessConfig,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError>
where
    S: CacheStore,
    B: ImageBackend,
{
    let concurrency = config.concurrency.max(1);
    let persist_every = config.persist_every.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency)
        .thread_name(|i| format!("hash-worker-{i}"))
        .build()?;

    let emit = |event: ProcessEvent| {
        if let Some(tx) = &events {
            // Receiver gone means nobody is watching; keep working.
            tx.send(event).ok();
        }
    };

    let total = candidates.len();
    emit(ProcessEvent::Started {
        total,
        cached: candidates.iter().filter(|n| store.get(n).is_some()).count(),
        concurrency,
    });

    let mut slots: Vec<Option<PhotoDescriptor>> = vec![None; total];
    let mut stats = CacheStats::default();
    let mut settled = 0;
    let mut unpersisted = 0;

    for (batch_index, batch) in candidates.chunks(concurrency).enumerate() {
        let offset = batch_index * concurrency;
        emit(ProcessEvent::BatchStarted {
            batch: batch_index + 1,
            size: batch.len(),
        });

        let mut misses = Vec::new();
        for (i, name) in batch.iter().enumerate() {
            match store.get(name) {
                Some(entry) => {
                    slots[offset + i] = Some(PhotoDescriptor::from_entry(name, entry, &config.urls));
                    stats.hit();
                    settled += 1;
                    emit(ProcessEvent::ItemResolved {
                        position: settled,
                        total,
                        name: name.clone(),
                        cached: true,
                    });
                }
                None => misses.push((offset + i, name)),
            }
        }

        let results: Vec<(usize, &String, Result<HashedPhoto, String>)> = pool.install(|| {
            misses
                .par_iter()
                .map(|&(index, name)| {
                    let path = photos_dir.join(name);
                    let result = run_isolated(|| hash_photo(backend, &path, &config.placeholder));
                    (index, name, result)
                })
                .collect()
        });

        for (index, name, result) in results {
            settled += 1;
            match result {
                Ok(hashed) => {
                    let entry = CacheEntry::new(name, hashed.dimensions, hashed.hash);
                    slots[index] = Some(PhotoDescriptor::from_entry(name, &entry, &config.urls));
                    store.put(name.clone(), entry);
                    stats.hash();
                    emit(ProcessEvent::ItemResolved {
                        position: settled,
                        total,
                        name: name.clone(),
                        cached: false,
                    });

                    unpersisted += 1;
                    if unpersisted >= persist_every {
                        store.persist()?;
                        unpersisted = 0;
                        emit(ProcessEvent::CachePersisted {
                            entries: store.len(),
                        });
                    }
                }
                Err(message) => {
                    tracing::warn!(file = %name, error = %message, "placeholder failed, leaving photo out");
                    stats.fail();
                    emit(ProcessEvent::ItemFailed {
                        position: settled,
                        total,
                        name: name.clone(),
                        message,
                    });
                }
            }
        }

        emit(ProcessEvent::BatchFinished {
            processed: settled,
            total,
        });
    }

    store.persist()?;
    emit(ProcessEvent::CachePersisted {
        entries: store.len(),
    });

    Ok(ProcessResult {
        photos: slots.into_iter().flatten().collect(),
        stats,
    })
}

/// Run one hash task, turning both errors and panics into a message.
fn run_isolated<T>(task: impl FnOnce() -> Result<T, BackendError>) -> Result<T, String> {
    match catch_unwind(AssertUnwindSafe(task)) {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(payload) => Err(format!("worker panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
