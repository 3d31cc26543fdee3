//! Correlating removed/added file pairs into moves.

use std::collections::{HashMap, HashSet, VecDeque};
use std::mem;
use std::path::Path;

use tracing::debug;

use ddm_hash::{DigestCache, FileHasher, HashError};
use ddm_types::{CancelToken, ContentId, Entry, RelativePath, Side};

use crate::error::{EngineError, EngineResult};
use crate::report::DiffEntry;

/// Rewrite `entries` in place, collapsing each added file whose
/// `(digest, size)` matches a removed file into a single move reported
/// at the destination path.
///
/// Candidates are indexed by digest and consumed in path order on both
/// sides, so ties between equal-content files resolve the same way on
/// every run. A file that fails to hash simply keeps its added/removed
/// classification. Added-side sizes are indexed before anything is
/// hashed, so deletion-only diffs (and removed files whose size has no
/// added counterpart) read no content at all.
pub(crate) fn detect_moves(
    entries: &mut Vec<DiffEntry>,
    left_root: &Path,
    right_root: &Path,
    hasher: &FileHasher,
    cache: &mut DigestCache,
    cancel: &CancelToken,
) -> EngineResult<()> {
    let mut added_indices: Vec<usize> = Vec::new();
    let mut added_sizes: HashSet<u64> = HashSet::new();
    for (index, entry) in entries.iter().enumerate() {
        if let DiffEntry::Added { entry } = entry {
            if entry.is_file() {
                added_indices.push(index);
                added_sizes.insert(entry.size);
            }
        }
    }
    if added_indices.is_empty() {
        return Ok(());
    }

    // Removed files next, keyed by content identity, queued in the
    // path order they already appear in.
    let mut candidates: HashMap<(ContentId, u64), VecDeque<usize>> = HashMap::new();
    for (index, entry) in entries.iter().enumerate() {
        if let DiffEntry::Removed { entry } = entry {
            if !entry.is_file() || !added_sizes.contains(&entry.size) {
                continue;
            }
            match digest(Side::Left, entry, left_root, hasher, cache, cancel)? {
                Some(id) => {
                    candidates.entry((id, entry.size)).or_default().push_back(index);
                }
                None => continue,
            }
        }
    }
    if candidates.is_empty() {
        return Ok(());
    }

    // Match added files against the queues, earliest removal first.
    let mut consumed: HashSet<usize> = HashSet::new();
    let mut moved_from: HashMap<usize, RelativePath> = HashMap::new();
    for &index in &added_indices {
        if let DiffEntry::Added { entry } = &entries[index] {
            let id = match digest(Side::Right, entry, right_root, hasher, cache, cancel)? {
                Some(id) => id,
                None => continue,
            };
            if let Some(queue) = candidates.get_mut(&(id, entry.size)) {
                if let Some(removed_index) = queue.pop_front() {
                    consumed.insert(removed_index);
                    if let DiffEntry::Removed { entry: removed } = &entries[removed_index] {
                        moved_from.insert(index, removed.path.clone());
                    }
                }
            }
        }
    }
    if consumed.is_empty() {
        return Ok(());
    }

    let rewritten = mem::take(entries)
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            if consumed.contains(&index) {
                return None;
            }
            match moved_from.remove(&index) {
                Some(from) => {
                    if let DiffEntry::Added { entry } = entry {
                        debug!(from = %from, to = %entry.path, "collapsed move");
                        Some(DiffEntry::Moved { from, entry })
                    } else {
                        Some(entry)
                    }
                }
                None => Some(entry),
            }
        })
        .collect();
    *entries = rewritten;
    Ok(())
}

fn digest(
    side: Side,
    entry: &Entry,
    root: &Path,
    hasher: &FileHasher,
    cache: &mut DigestCache,
    cancel: &CancelToken,
) -> EngineResult<Option<ContentId>> {
    let file = entry.path.to_fs_path(root);
    match cache.get_or_compute(side, &entry.path, &file, entry.size, hasher, cancel) {
        Ok(id) => Ok(Some(id)),
        Err(HashError::Cancelled) => Err(EngineError::Cancelled),
        Err(err) => {
            debug!(side = %side, path = %entry.path, error = %err, "skipping move candidate");
            Ok(None)
        }
    }
}
