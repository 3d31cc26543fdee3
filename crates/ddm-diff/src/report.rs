//! The diff report and its builder.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use ddm_types::{Entry, RelativePath, Side};
use ddm_walk::{WalkErrorKind, WalkErrorRecord};

/// Which comparison criterion triggered (or almost triggered) a change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    /// The entry kind differs (e.g. was a file, now a directory).
    KindChanged,
    /// Content digests differ.
    ContentDiffered,
    /// Symlink targets differ.
    TargetChanged,
    /// Permission bits differ (only with permission comparison enabled).
    PermissionsChanged,
    /// Metadata differed but content digests matched; attached to an
    /// Unchanged entry.
    MetadataDifferedButContentSame,
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeReason::KindChanged => write!(f, "kind changed"),
            ChangeReason::ContentDiffered => write!(f, "content differed"),
            ChangeReason::TargetChanged => write!(f, "symlink target changed"),
            ChangeReason::PermissionsChanged => write!(f, "permissions changed"),
            ChangeReason::MetadataDifferedButContentSame => {
                write!(f, "metadata differed but content is the same")
            }
        }
    }
}

/// The classified outcome for one relative path.
///
/// Produced once, immutable, ordered by relative path in the report
/// (a move sorts at its destination path).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "change")]
pub enum DiffEntry {
    /// Present only on the right side.
    Added { entry: Entry },
    /// Present only on the left side.
    Removed { entry: Entry },
    /// Present on both sides with a difference.
    Modified {
        left: Entry,
        right: Entry,
        reason: ChangeReason,
    },
    /// Present on both sides without a difference; `reason` records a
    /// near-miss (metadata drift with equal content) when applicable.
    Unchanged {
        entry: Entry,
        reason: Option<ChangeReason>,
    },
    /// A removed/added pair with equal content, collapsed. `entry` is
    /// the destination-side entry; `from` is the source path.
    Moved { from: RelativePath, entry: Entry },
}

impl DiffEntry {
    /// The relative path this entry is reported under.
    pub fn path(&self) -> &RelativePath {
        match self {
            DiffEntry::Added { entry }
            | DiffEntry::Removed { entry }
            | DiffEntry::Unchanged { entry, .. }
            | DiffEntry::Moved { entry, .. } => &entry.path,
            DiffEntry::Modified { right, .. } => &right.path,
        }
    }

    /// Returns `true` for entries that represent no difference.
    pub fn is_unchanged(&self) -> bool {
        matches!(self, DiffEntry::Unchanged { .. })
    }
}

/// A per-entry failure recorded in the report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Which tree the failure occurred in.
    pub side: Side,
    pub path: RelativePath,
    pub kind: WalkErrorKind,
    pub detail: String,
}

impl ErrorRecord {
    pub fn from_walk(side: Side, record: WalkErrorRecord) -> Self {
        Self {
            side,
            path: record.path,
            kind: record.kind,
            detail: record.detail,
        }
    }
}

/// Aggregate counts over a report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub moved: usize,
    pub unchanged: usize,
    pub errors: usize,
}

/// The result of one diff run.
///
/// `entries` is strictly increasing by relative path; `errors` is
/// sorted by path independently. Every path observed by either walker
/// appears exactly once across the two sequences: a path that produced
/// a walk or read error on either side is excluded from `entries`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    pub entries: Vec<DiffEntry>,
    pub errors: Vec<ErrorRecord>,
}

impl DiffReport {
    /// Returns `true` if the trees matched completely and no per-entry
    /// errors were recorded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.entries.iter().all(DiffEntry::is_unchanged)
    }

    /// Returns `true` if any entry records a difference.
    pub fn has_differences(&self) -> bool {
        !self.entries.iter().all(DiffEntry::is_unchanged)
    }

    /// Count entries per classification.
    pub fn summary(&self) -> DiffSummary {
        let mut summary = DiffSummary {
            errors: self.errors.len(),
            ..DiffSummary::default()
        };
        for entry in &self.entries {
            match entry {
                DiffEntry::Added { .. } => summary.added += 1,
                DiffEntry::Removed { .. } => summary.removed += 1,
                DiffEntry::Modified { .. } => summary.modified += 1,
                DiffEntry::Moved { .. } => summary.moved += 1,
                DiffEntry::Unchanged { .. } => summary.unchanged += 1,
            }
        }
        summary
    }
}

/// Accumulates classification output, then seals it into a report.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    entries: Vec<DiffEntry>,
    errors: Vec<ErrorRecord>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_entry(&mut self, entry: DiffEntry) {
        self.entries.push(entry);
    }

    pub fn push_walk_error(&mut self, side: Side, record: WalkErrorRecord) {
        self.errors.push(ErrorRecord::from_walk(side, record));
    }

    /// Mutable access for the move-detection rewrite pass.
    pub(crate) fn entries_mut(&mut self) -> &mut Vec<DiffEntry> {
        &mut self.entries
    }

    /// Drop classified entries for paths that also carry error records.
    /// `finish` applies this as well; the move pass needs it beforehand
    /// so an errored path can never become a move endpoint.
    pub(crate) fn exclude_errored_entries(&mut self) {
        if self.errors.is_empty() {
            return;
        }
        let error_paths: BTreeSet<RelativePath> =
            self.errors.iter().map(|record| record.path.clone()).collect();
        self.entries
            .retain(|entry| !error_paths.contains(entry.path()));
    }

    /// Seal the report: drop classified entries for paths that also
    /// have error records, and order both sequences by path.
    pub fn finish(mut self) -> DiffReport {
        self.exclude_errored_entries();
        self.entries.sort_by(|a, b| a.path().cmp(b.path()));
        self.errors
            .sort_by(|a, b| (&a.path, a.side).cmp(&(&b.path, b.side)));
        DiffReport {
            entries: self.entries,
            errors: self.errors,
        }
    }
}
