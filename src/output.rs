//! CLI output formatting for all pipeline stages.
//!
//! User-facing progress goes to stdout through this module. Diagnostics
//! (cache cold starts, skipped files, per-photo failures) go through
//! `tracing` to stderr and are not formatted here.
//!
//! # Output Format
//!
//! ## Sync
//!
//! ```text
//! Published directory created: public/photos
//! Deleted 1 photo
//!     old.jpg
//! Compressed 2 photos
//!     sunset.jpg
//!     harbour.png
//! Skipped 1 photo (unsupported format)
//!     anim.gif
//! ```
//!
//! ## Process
//!
//! ```text
//! Found 10 photos to process
//! 7 photos found in cache (70%)
//! Processing with 3 workers
//! [1/10] Processed: sunset.jpg (from cache)
//! [2/10] Error processing broken.jpg: Processing failed: ...
//! [███████████████████░░░░░░░░░░░] 3/10 (30%)
//! Cache saved with 9 entries
//! ```
//!
//! ## Summary
//!
//! ```text
//! Processing complete: 10 total, 7 from cache, 2 newly processed, 1 failed
//! Manifest: src/photos.json (9 photos)
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::cache::CacheStats;
use crate::compress::CompressReport;
use crate::process::ProcessEvent;
use crate::reconcile::Reconciliation;
use std::path::Path;

/// Width of the progress bar in cells.
const BAR_CELLS: usize = 30;

// ============================================================================
// Shared helpers
// ============================================================================

/// `1 photo` / `3 photos`.
fn photo_count(n: usize) -> String {
    if n == 1 {
        "1 photo".to_string()
    } else {
        format!("{n} photos")
    }
}

/// Whole percentage, rounded down. An empty total counts as complete.
fn percent(current: usize, total: usize) -> usize {
    if total == 0 {
        100
    } else {
        current * 100 / total
    }
}

fn indent(name: &str) -> String {
    format!("    {name}")
}

/// Render a progress bar.
///
/// ```text
/// [█████████░░░░░░░░░░░░░░░░░░░░░] 3/10 (30%)
/// ```
///
/// Filled cells and percentage both round down.
pub fn progress_bar(current: usize, total: usize) -> String {
    let filled = if total == 0 {
        BAR_CELLS
    } else {
        (current * BAR_CELLS / total).min(BAR_CELLS)
    };
    format!(
        "[{}{}] {}/{} ({}%)",
        "█".repeat(filled),
        "░".repeat(BAR_CELLS - filled),
        current,
        total,
        percent(current, total)
    )
}

// ============================================================================
// Sync / check output
// ============================================================================

/// Format the outcome of reconciling and compressing.
pub fn format_sync_output(
    created_published_dir: Option<&Path>,
    deleted: &[String],
    report: &CompressReport,
) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(dir) = created_published_dir {
        lines.push(format!("Published directory created: {}", dir.display()));
    }
    if !deleted.is_empty() {
        lines.push(format!("Deleted {}", photo_count(deleted.len())));
        lines.extend(deleted.iter().map(|n| indent(n)));
    }
    if !report.compressed.is_empty() {
        lines.push(format!("Compressed {}", photo_count(report.compressed.len())));
        lines.extend(report.compressed.iter().map(|n| indent(n)));
    }
    if !report.skipped.is_empty() {
        lines.push(format!(
            "Skipped {} (unsupported format)",
            photo_count(report.skipped.len())
        ));
        lines.extend(report.skipped.iter().map(|n| indent(n)));
    }
    if lines.is_empty() {
        lines.push("Published photos are up to date".to_string());
    }
    lines
}

pub fn print_sync_output(
    created_published_dir: Option<&Path>,
    deleted: &[String],
    report: &CompressReport,
) {
    for line in format_sync_output(created_published_dir, deleted, report) {
        println!("{}", line);
    }
}

/// Format a dry-run reconciliation for `check`.
pub fn format_check_output(plan: &Reconciliation) -> Vec<String> {
    if plan.is_empty() {
        return vec!["Published photos are up to date".to_string()];
    }
    let mut lines = Vec::new();
    if !plan.deletions.is_empty() {
        lines.push(format!("Would delete {}", photo_count(plan.deletions.len())));
        lines.extend(plan.deletions.iter().map(|n| indent(n)));
    }
    if !plan.additions.is_empty() {
        lines.push(format!("Would compress {}", photo_count(plan.additions.len())));
        lines.extend(plan.additions.iter().map(|n| indent(n)));
    }
    lines
}

pub fn print_check_output(plan: &Reconciliation) {
    for line in format_check_output(plan) {
        println!("{}", line);
    }
}

// ============================================================================
// Process output
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Started {
            total,
            cached,
            concurrency,
        } => vec![
            format!("Found {} to process", photo_count(*total)),
            format!(
                "{} found in cache ({}%)",
                photo_count(*cached),
                percent(*cached, *total)
            ),
            format!("Processing with {} workers", concurrency),
        ],
        // Batch boundaries are visible through the progress bar already.
        ProcessEvent::BatchStarted { .. } => Vec::new(),
        ProcessEvent::ItemResolved {
            position,
            total,
            name,
            cached,
        } => {
            let origin = if *cached { " (from cache)" } else { "" };
            vec![format!("[{position}/{total}] Processed: {name}{origin}")]
        }
        ProcessEvent::ItemFailed {
            position,
            total,
            name,
            message,
        } => vec![format!("[{position}/{total}] Error processing {name}: {message}")],
        ProcessEvent::BatchFinished { processed, total } => {
            vec![progress_bar(*processed, *total)]
        }
        ProcessEvent::CachePersisted { entries } => {
            vec![format!("Cache saved with {} entries", entries)]
        }
    }
}

/// Format the end-of-run summary.
pub fn format_process_summary(stats: &CacheStats, manifest: &Path, photos: usize) -> Vec<String> {
    let mut line = format!(
        "Processing complete: {} total, {} from cache, {} newly processed",
        stats.total(),
        stats.hits,
        stats.hashed
    );
    if stats.failed > 0 {
        line.push_str(&format!(", {} failed", stats.failed));
    }
    vec![
        line,
        format!("Manifest: {} ({})", manifest.display(), photo_count(photos)),
    ]
}

pub fn print_process_summary(stats: &CacheStats, manifest: &Path, photos: usize) {
    for line in format_process_summary(stats, manifest, photos) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // =========================================================================
    // Progress bar
    // =========================================================================

    #[test]
    fn progress_bar_partial() {
        assert_eq!(
            progress_bar(3, 10),
            format!("[{}{}] 3/10 (30%)", "█".repeat(9), "░".repeat(21))
        );
    }

    #[test]
    fn progress_bar_rounds_down() {
        // 1/3 of 30 cells = 10, 33.3% -> 33
        assert_eq!(
            progress_bar(1, 3),
            format!("[{}{}] 1/3 (33%)", "█".repeat(10), "░".repeat(20))
        );
        // 2/7 of 30 = 8.57 -> 8, 28.5% -> 28
        assert!(progress_bar(2, 7).starts_with(&format!("[{}░", "█".repeat(8))));
        assert!(progress_bar(2, 7).ends_with("2/7 (28%)"));
    }

    #[test]
    fn progress_bar_complete() {
        assert_eq!(progress_bar(4, 4), format!("[{}] 4/4 (100%)", "█".repeat(30)));
    }

    #[test]
    fn progress_bar_empty_total() {
        assert_eq!(progress_bar(0, 0), format!("[{}] 0/0 (100%)", "█".repeat(30)));
    }

    #[test]
    fn progress_bar_start() {
        assert_eq!(progress_bar(0, 5), format!("[{}] 0/5 (0%)", "░".repeat(30)));
    }

    // =========================================================================
    // Process events
    // =========================================================================

    #[test]
    fn started_event_lines() {
        let lines = format_process_event(&ProcessEvent::Started {
            total: 10,
            cached: 7,
            concurrency: 3,
        });
        assert_eq!(
            lines,
            vec![
                "Found 10 photos to process",
                "7 photos found in cache (70%)",
                "Processing with 3 workers",
            ]
        );
    }

    #[test]
    fn started_event_with_no_photos() {
        let lines = format_process_event(&ProcessEvent::Started {
            total: 0,
            cached: 0,
            concurrency: 1,
        });
        assert_eq!(lines[0], "Found 0 photos to process");
        assert_eq!(lines[1], "0 photos found in cache (100%)");
    }

    #[test]
    fn resolved_event_marks_cache_hits() {
        let cached = format_process_event(&ProcessEvent::ItemResolved {
            position: 1,
            total: 10,
            name: "sunset.jpg".into(),
            cached: true,
        });
        assert_eq!(cached, vec!["[1/10] Processed: sunset.jpg (from cache)"]);

        let fresh = format_process_event(&ProcessEvent::ItemResolved {
            position: 2,
            total: 10,
            name: "harbour.png".into(),
            cached: false,
        });
        assert_eq!(fresh, vec!["[2/10] Processed: harbour.png"]);
    }

    #[test]
    fn failed_event_carries_message() {
        let lines = format_process_event(&ProcessEvent::ItemFailed {
            position: 4,
            total: 5,
            name: "broken.jpg".into(),
            message: "bad header".into(),
        });
        assert_eq!(lines, vec!["[4/5] Error processing broken.jpg: bad header"]);
    }

    #[test]
    fn batch_started_is_silent() {
        assert!(format_process_event(&ProcessEvent::BatchStarted { batch: 1, size: 3 }).is_empty());
    }

    #[test]
    fn batch_finished_prints_progress_bar() {
        let lines = format_process_event(&ProcessEvent::BatchFinished {
            processed: 3,
            total: 10,
        });
        assert_eq!(lines, vec![progress_bar(3, 10)]);
    }

    #[test]
    fn cache_persisted_event() {
        let lines = format_process_event(&ProcessEvent::CachePersisted { entries: 12 });
        assert_eq!(lines, vec!["Cache saved with 12 entries"]);
    }

    // =========================================================================
    // Sync / check
    // =========================================================================

    #[test]
    fn sync_output_lists_everything() {
        let report = CompressReport {
            compressed: names(&["a.jpg", "b.png"]),
            skipped: names(&["anim.gif"]),
        };
        let lines = format_sync_output(
            Some(Path::new("public/photos")),
            &names(&["old.jpg"]),
            &report,
        );
        assert_eq!(
            lines,
            vec![
                "Published directory created: public/photos",
                "Deleted 1 photo",
                "    old.jpg",
                "Compressed 2 photos",
                "    a.jpg",
                "    b.png",
                "Skipped 1 photo (unsupported format)",
                "    anim.gif",
            ]
        );
    }

    #[test]
    fn sync_output_nothing_to_do() {
        let lines = format_sync_output(None, &[], &CompressReport::default());
        assert_eq!(lines, vec!["Published photos are up to date"]);
    }

    #[test]
    fn check_output_lists_plan() {
        let plan = Reconciliation {
            deletions: names(&["old.jpg"]),
            additions: names(&["new.jpg", "newer.jpg"]),
        };
        assert_eq!(
            format_check_output(&plan),
            vec![
                "Would delete 1 photo",
                "    old.jpg",
                "Would compress 2 photos",
                "    new.jpg",
                "    newer.jpg",
            ]
        );
    }

    #[test]
    fn check_output_up_to_date() {
        assert_eq!(
            format_check_output(&Reconciliation::default()),
            vec!["Published photos are up to date"]
        );
    }

    // =========================================================================
    // Summary
    // =========================================================================

    #[test]
    fn summary_without_failures() {
        let stats = CacheStats {
            hits: 7,
            hashed: 3,
            failed: 0,
        };
        let lines = format_process_summary(&stats, Path::new("src/photos.json"), 10);
        assert_eq!(
            lines,
            vec![
                "Processing complete: 10 total, 7 from cache, 3 newly processed",
                "Manifest: src/photos.json (10 photos)",
            ]
        );
    }

    #[test]
    fn summary_with_failures() {
        let stats = CacheStats {
            hits: 1,
            hashed: 0,
            failed: 1,
        };
        let lines = format_process_summary(&stats, Path::new("photos.json"), 1);
        assert_eq!(
            lines[0],
            "Processing complete: 2 total, 1 from cache, 0 newly processed, 1 failed"
        );
        assert_eq!(lines[1], "Manifest: photos.json (1 photo)");
    }
}
