//! Walk events and per-entry error records.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};

use ddm_types::{Entry, RelativePath};

/// Classification of a recoverable per-entry failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WalkErrorKind {
    /// The entry or its contents could not be accessed.
    PermissionDenied,
    /// Any other I/O failure, including broken symlink targets and
    /// files that changed size mid-read.
    ReadError,
    /// Following symlinks led back to an already-visited directory.
    CycleDetected,
}

impl fmt::Display for WalkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkErrorKind::PermissionDenied => write!(f, "permission denied"),
            WalkErrorKind::ReadError => write!(f, "read error"),
            WalkErrorKind::CycleDetected => write!(f, "cycle detected"),
        }
    }
}

/// A recoverable failure tied to one relative path.
///
/// The offending path is excluded from classification; the walk goes on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkErrorRecord {
    pub path: RelativePath,
    pub kind: WalkErrorKind,
    pub detail: String,
}

impl WalkErrorRecord {
    pub fn new(path: RelativePath, kind: WalkErrorKind, detail: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            detail: detail.into(),
        }
    }

    /// Build a record from an I/O error, mapping `PermissionDenied`
    /// through and treating everything else as a read error.
    pub fn from_io(path: RelativePath, err: &io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::PermissionDenied => WalkErrorKind::PermissionDenied,
            _ => WalkErrorKind::ReadError,
        };
        Self::new(path, kind, err.to_string())
    }
}

/// One item of a walk: either an observed entry or a per-entry failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalkEvent {
    Entry(Entry),
    Error(WalkErrorRecord),
}

impl WalkEvent {
    /// The relative path this event is about.
    pub fn path(&self) -> &RelativePath {
        match self {
            WalkEvent::Entry(entry) => &entry.path,
            WalkEvent::Error(record) => &record.path,
        }
    }
}

/// Errors from building a [`crate::PathFilter`].
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// An exclude pattern failed to parse.
    #[error("invalid exclude pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: ignore::Error,
    },

    /// The pattern set failed to compile as a whole.
    #[error("failed to build exclude matcher: {0}")]
    Build(#[from] ignore::Error),
}
