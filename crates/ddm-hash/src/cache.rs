//! Per-run digest memoization.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use ddm_types::{CancelToken, ContentId, RelativePath, Side};

use crate::error::HashResult;
use crate::hasher::FileHasher;

/// Memoizes digests per `(side, relative path)` for one diff run.
///
/// A file is hashed at most once per side even if the classifier and
/// the move detector both ask for it. Failures are not memoized; a
/// retry re-reads the file. The cache is scoped to one run and passed
/// by handle so no hash state outlives or leaks between runs.
#[derive(Debug, Default)]
pub struct DigestCache {
    entries: HashMap<(Side, RelativePath), ContentId>,
}

impl DigestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoized digests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been memoized yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a memoized digest without computing.
    pub fn get(&self, side: Side, path: &RelativePath) -> Option<ContentId> {
        self.entries.get(&(side, path.clone())).copied()
    }

    /// Return the digest for `(side, path)`, computing and memoizing it
    /// on first use.
    pub fn get_or_compute(
        &mut self,
        side: Side,
        path: &RelativePath,
        file: &Path,
        expected_size: u64,
        hasher: &FileHasher,
        cancel: &CancelToken,
    ) -> HashResult<ContentId> {
        let key = (side, path.clone());
        if let Some(id) = self.entries.get(&key) {
            return Ok(*id);
        }
        let id = hasher.digest_file(file, expected_size, cancel)?;
        debug!(side = %side, path = %path, digest = %id.short_hex(), "hashed file");
        self.entries.insert(key, id);
        Ok(id)
    }
}
