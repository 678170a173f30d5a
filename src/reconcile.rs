//! Directory reconciliation between the source and published photo folders.
//!
//! The published directory mirrors the source directory by file name. A run
//! diffs the two listings:
//!
//! ```text
//! deletions = published − source     removed from the published directory
//! additions = source − published     handed to the compressor
//! ```
//!
//! The diff itself is the pure function [`reconcile`]; listing and deleting
//! are thin I/O wrappers around it. Both listings are filtered by the
//! ignore-list and deduplicated before diffing, and the keep-file sentinel
//! is never part of either set.
//!
//! This module also owns candidate ordering for the hash stage: published
//! photos sorted newest first by creation time.

use crate::manifest::KEEP_FILE;
use crate::naming;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("IO error reading {dir}: {source}")]
    Listing { dir: String, source: io::Error },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// The work implied by diffing source against published.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Published names with no source counterpart, sorted.
    pub deletions: Vec<String>,
    /// Source names not yet published, sorted.
    pub additions: Vec<String>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty() && self.additions.is_empty()
    }
}

/// Diff two directory listings.
///
/// Pure: no filesystem access. Ignored names and duplicates are dropped from
/// both inputs first, so the result never mentions an ignored file.
pub fn reconcile(source: &[String], published: &[String], ignore: &[String]) -> Reconciliation {
    let filter = |names: &[String]| -> BTreeSet<String> {
        names
            .iter()
            .filter(|n| is_listed(n, ignore))
            .cloned()
            .collect()
    };
    let source = filter(source);
    let published = filter(published);
    Reconciliation {
        deletions: published.difference(&source).cloned().collect(),
        additions: source.difference(&published).cloned().collect(),
    }
}

/// Create `dir` if it is missing. Returns whether it had to be created.
pub fn ensure_dir(dir: &Path) -> Result<bool, ReconcileError> {
    if dir.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(dir)?;
    Ok(true)
}

/// List regular files in `dir`, sorted, ignore-filtered, keep-file excluded.
///
/// Symlinks are followed, so a linked photo counts as a file. Dangling links
/// and names that are not valid UTF-8 are skipped with a warning. Leftover
/// encoder output (see [`naming::is_partial`]) is never listed.
pub fn list_names(dir: &Path, ignore: &[String]) -> Result<Vec<String>, ReconcileError> {
    let entries = fs::read_dir(dir).map_err(|source| ReconcileError::Listing {
        dir: dir.display().to_string(),
        source,
    })?;
    let mut names = BTreeSet::new();
    for entry in entries {
        let entry = entry?;
        let metadata = match fs::metadata(entry.path()) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) if is_listed(&name, ignore) => {
                names.insert(name);
            }
            Ok(_) => {}
            Err(raw) => {
                tracing::warn!(name = ?raw, dir = %dir.display(), "skipping non UTF-8 file name");
            }
        }
    }
    Ok(names.into_iter().collect())
}

fn is_listed(name: &str, ignore: &[String]) -> bool {
    name != KEEP_FILE && !naming::is_partial(name) && !naming::is_ignored(name, ignore)
}

/// Remove encoder output left behind by an interrupted run.
///
/// Best effort, like [`apply_deletions`]. Returns the number removed.
pub fn clear_partials(dir: &Path) -> Result<usize, ReconcileError> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_partial = entry
            .file_name()
            .to_str()
            .is_some_and(naming::is_partial);
        if !is_partial {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "could not remove partial output")
            }
        }
    }
    Ok(removed)
}

/// Remove `deletions` from `dir`, best effort.
///
/// Already-missing files count as done. Any other failure is logged and the
/// remaining deletions still run. Returns the number of files removed.
pub fn apply_deletions(dir: &Path, deletions: &[String]) -> usize {
    let mut removed = 0;
    for name in deletions {
        match fs::remove_file(dir.join(name)) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(file = %name, error = %e, "could not delete published photo"),
        }
    }
    removed
}

/// Sort names newest first.
///
/// A missing timestamp sorts as the most recent. Ties keep their input
/// order, so a sorted listing stays deterministic.
pub fn sort_newest_first(mut photos: Vec<(String, Option<SystemTime>)>) -> Vec<String> {
    photos.sort_by(|(_, a), (_, b)| match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => b.cmp(a),
    });
    photos.into_iter().map(|(name, _)| name).collect()
}

/// Candidate photos for the hash stage: the published listing, newest first.
///
/// Creation time comes from the filesystem; where it is unavailable (some
/// filesystems do not record it) the photo is treated as most recent.
pub fn list_candidates(dir: &Path, ignore: &[String]) -> Result<Vec<String>, ReconcileError> {
    let names = list_names(dir, ignore)?;
    let stamped = names
        .into_iter()
        .map(|name| {
            let created = fs::metadata(dir.join(&name))
                .and_then(|m| m.created())
                .ok();
            (name, created)
        })
        .collect();
    Ok(sort_newest_first(stamped))
}
