//! Per-run configuration.

use ddm_types::{CancelToken, HashAlgorithm};

/// Configuration for one `compute_diff` run.
#[derive(Clone, Debug, Default)]
pub struct DiffConfig {
    /// Resolve symlinks and descend into symlinked directories.
    pub follow_symlinks: bool,
    /// Gitignore-style patterns; matching paths are skipped entirely.
    pub exclude_patterns: Vec<String>,
    /// Collapse equal-content removed/added file pairs into moves.
    pub detect_moves: bool,
    /// Digest function standing in for content equality.
    pub hash_algorithm: HashAlgorithm,
    /// Also compare permission bits on paired entries.
    pub compare_permissions: bool,
    /// Cooperative cancellation for this run.
    pub cancel: CancelToken,
}
