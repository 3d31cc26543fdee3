//! The top-level diff entry point.

use std::path::Path;

use tracing::debug;

use ddm_hash::{DigestCache, FileHasher};
use ddm_walk::{PathFilter, WalkOptions, Walker};

use crate::align::{AlignItem, Aligner};
use crate::classify::{Classified, Classifier};
use crate::config::DiffConfig;
use crate::error::{EngineError, EngineResult};
use crate::moves;
use crate::report::{DiffReport, ReportBuilder};

/// Compare the trees rooted at `left_root` and `right_root`.
///
/// Both trees are walked in lockstep, entries sharing a relative path
/// are classified together, and the result is returned as an ordered
/// [`DiffReport`]. Per-entry failures (permission denied, vanished
/// files, symlink cycles) are recorded in the report; only root
/// validation, bad configuration, and cancellation abort the run.
pub fn compute_diff(
    left_root: &Path,
    right_root: &Path,
    config: &DiffConfig,
) -> EngineResult<DiffReport> {
    let filter = PathFilter::from_patterns(&config.exclude_patterns)
        .map_err(|err| EngineError::InvalidConfig(err.to_string()))?;
    validate_root(left_root)?;
    validate_root(right_root)?;

    let options = WalkOptions {
        follow_symlinks: config.follow_symlinks,
        filter,
    };
    let left_walk = Walker::new(left_root, options.clone(), config.cancel.clone());
    let right_walk = Walker::new(right_root, options, config.cancel.clone());

    let hasher = FileHasher::new(config.hash_algorithm);
    let mut cache = DigestCache::new();
    let mut classifier = Classifier::new(
        left_root,
        right_root,
        &hasher,
        &mut cache,
        config.compare_permissions,
        &config.cancel,
    );

    let mut builder = ReportBuilder::new();
    for item in Aligner::new(left_walk, right_walk) {
        if config.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        match item {
            AlignItem::Pair(pair) => match classifier.classify(pair.left, pair.right)? {
                Classified::Entry(entry) => builder.push_entry(entry),
                Classified::Failed(side, record) => builder.push_walk_error(side, record),
            },
            AlignItem::WalkError(side, record) => builder.push_walk_error(side, record),
        }
    }
    // A cancelled walker ends its stream silently; distinguish that
    // from ordinary exhaustion.
    if config.cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    if config.detect_moves {
        // Errored paths must leave the entry list before move
        // correlation, or a path could surface both as an error record
        // and inside a Moved entry.
        builder.exclude_errored_entries();
        moves::detect_moves(
            builder.entries_mut(),
            left_root,
            right_root,
            &hasher,
            &mut cache,
            &config.cancel,
        )?;
    }

    let report = builder.finish();
    debug!(
        entries = report.entries.len(),
        errors = report.errors.len(),
        digests = cache.len(),
        "diff complete"
    );
    Ok(report)
}

fn validate_root(root: &Path) -> EngineResult<()> {
    let metadata = std::fs::metadata(root)
        .map_err(|_| EngineError::PathNotFound(root.to_path_buf()))?;
    if !metadata.is_dir() {
        return Err(EngineError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}
