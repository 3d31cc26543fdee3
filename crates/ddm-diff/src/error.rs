//! Whole-operation errors.
//!
//! Everything here aborts the entire diff; recoverable per-entry
//! failures never surface as [`EngineError`], they are recorded in the
//! report's error list.

use std::path::PathBuf;

/// Errors that abort a diff run without producing a report.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A comparison root does not exist.
    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    /// A comparison root exists but is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The configuration was rejected before any walking began.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The run was cancelled; no partial report is returned.
    #[error("diff cancelled")]
    Cancelled,
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
