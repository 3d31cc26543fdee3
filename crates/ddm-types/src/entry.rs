use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::path::RelativePath;

/// Which comparison root an observation came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// The kind of a filesystem object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// Sockets, fifos, devices -- carried through but never content-compared.
    Other,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Directory => write!(f, "directory"),
            EntryKind::Symlink => write!(f, "symlink"),
            EntryKind::Other => write!(f, "other"),
        }
    }
}

/// A single filesystem object observed during a walk.
///
/// Immutable once yielded; owned by the walk that produced it until the
/// classifier takes it apart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Path relative to the walk's root.
    pub path: RelativePath,
    /// Object kind.
    pub kind: EntryKind,
    /// Size in bytes. Meaningful for files; zero otherwise.
    pub size: u64,
    /// Last modification time.
    pub mtime: SystemTime,
    /// Unix permission bits (zero on platforms without them).
    pub mode: u32,
    /// Symlink target, verbatim. Only present for `EntryKind::Symlink`.
    pub symlink_target: Option<String>,
}

impl Entry {
    /// Returns `true` if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Returns `true` if this entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}
