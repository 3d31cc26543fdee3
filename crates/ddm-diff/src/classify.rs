//! Turning aligned pairs into diff entries.

use std::path::{Path, PathBuf};

use ddm_hash::{DigestCache, FileHasher, HashError};
use ddm_types::{CancelToken, Entry, EntryKind, Side};
use ddm_walk::WalkErrorRecord;

use crate::error::{EngineError, EngineResult};
use crate::report::{ChangeReason, DiffEntry};

/// One classification outcome: a report entry, or a per-entry failure
/// (hashing failed on one side) recorded under the side it happened on.
#[derive(Debug)]
pub(crate) enum Classified {
    Entry(DiffEntry),
    Failed(Side, WalkErrorRecord),
}

/// Classifies aligned pairs, hashing file content on demand.
pub(crate) struct Classifier<'a> {
    left_root: &'a Path,
    right_root: &'a Path,
    hasher: &'a FileHasher,
    cache: &'a mut DigestCache,
    compare_permissions: bool,
    cancel: &'a CancelToken,
}

impl<'a> Classifier<'a> {
    pub(crate) fn new(
        left_root: &'a Path,
        right_root: &'a Path,
        hasher: &'a FileHasher,
        cache: &'a mut DigestCache,
        compare_permissions: bool,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            left_root,
            right_root,
            hasher,
            cache,
            compare_permissions,
            cancel,
        }
    }

    fn side_path(&self, side: Side, entry: &Entry) -> PathBuf {
        let root = match side {
            Side::Left => self.left_root,
            Side::Right => self.right_root,
        };
        entry.path.to_fs_path(root)
    }

    fn digest(&mut self, side: Side, entry: &Entry) -> EngineResult<Result<ddm_types::ContentId, WalkErrorRecord>> {
        let file = self.side_path(side, entry);
        match self.cache.get_or_compute(
            side,
            &entry.path,
            &file,
            entry.size,
            self.hasher,
            self.cancel,
        ) {
            Ok(id) => Ok(Ok(id)),
            Err(HashError::Cancelled) => Err(EngineError::Cancelled),
            Err(HashError::Io(err)) => {
                Ok(Err(WalkErrorRecord::from_io(entry.path.clone(), &err)))
            }
            Err(err @ HashError::SizeChanged { .. }) => Ok(Err(WalkErrorRecord::new(
                entry.path.clone(),
                ddm_walk::WalkErrorKind::ReadError,
                err.to_string(),
            ))),
        }
    }

    /// Classify one aligned pair.
    ///
    /// Files with matching size and mtime short-circuit as unchanged
    /// without reading content. Hash failures produce [`Classified::Failed`]
    /// so the path lands in the report's error list instead of being
    /// misclassified.
    pub(crate) fn classify(
        &mut self,
        left: Option<Entry>,
        right: Option<Entry>,
    ) -> EngineResult<Classified> {
        let (left, right) = match (left, right) {
            (Some(left), None) => return Ok(Classified::Entry(DiffEntry::Removed { entry: left })),
            (None, Some(right)) => return Ok(Classified::Entry(DiffEntry::Added { entry: right })),
            (Some(left), Some(right)) => (left, right),
            (None, None) => unreachable!("aligner never yields an empty pair"),
        };

        if left.kind != right.kind {
            return Ok(Classified::Entry(DiffEntry::Modified {
                left,
                right,
                reason: ChangeReason::KindChanged,
            }));
        }

        // Stronger reasons win: content and target differences are
        // reported ahead of a simultaneous permission difference.
        let perms_changed = self.compare_permissions && left.mode != right.mode;
        match left.kind {
            EntryKind::Directory | EntryKind::Other => {
                if perms_changed {
                    Ok(Classified::Entry(DiffEntry::Modified {
                        left,
                        right,
                        reason: ChangeReason::PermissionsChanged,
                    }))
                } else {
                    Ok(Classified::Entry(DiffEntry::Unchanged {
                        entry: right,
                        reason: None,
                    }))
                }
            }
            EntryKind::Symlink => {
                if left.symlink_target != right.symlink_target {
                    Ok(Classified::Entry(DiffEntry::Modified {
                        left,
                        right,
                        reason: ChangeReason::TargetChanged,
                    }))
                } else if perms_changed {
                    Ok(Classified::Entry(DiffEntry::Modified {
                        left,
                        right,
                        reason: ChangeReason::PermissionsChanged,
                    }))
                } else {
                    Ok(Classified::Entry(DiffEntry::Unchanged {
                        entry: right,
                        reason: None,
                    }))
                }
            }
            EntryKind::File => self.classify_files(left, right, perms_changed),
        }
    }

    fn classify_files(
        &mut self,
        left: Entry,
        right: Entry,
        perms_changed: bool,
    ) -> EngineResult<Classified> {
        // Equal size and mtime imply equal content; permission drift is
        // still reportable without reading a byte.
        let metadata_equal = left.size == right.size && left.mtime == right.mtime;
        if metadata_equal {
            if perms_changed {
                return Ok(Classified::Entry(DiffEntry::Modified {
                    left,
                    right,
                    reason: ChangeReason::PermissionsChanged,
                }));
            }
            return Ok(Classified::Entry(DiffEntry::Unchanged {
                entry: right,
                reason: None,
            }));
        }

        let left_id = match self.digest(Side::Left, &left)? {
            Ok(id) => id,
            Err(record) => return Ok(Classified::Failed(Side::Left, record)),
        };
        let right_id = match self.digest(Side::Right, &right)? {
            Ok(id) => id,
            Err(record) => return Ok(Classified::Failed(Side::Right, record)),
        };

        if left_id != right_id {
            Ok(Classified::Entry(DiffEntry::Modified {
                left,
                right,
                reason: ChangeReason::ContentDiffered,
            }))
        } else if perms_changed {
            Ok(Classified::Entry(DiffEntry::Modified {
                left,
                right,
                reason: ChangeReason::PermissionsChanged,
            }))
        } else {
            Ok(Classified::Entry(DiffEntry::Unchanged {
                entry: right,
                reason: Some(ChangeReason::MetadataDifferedButContentSame),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddm_types::{HashAlgorithm, RelativePath};
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn entry(path: &str, kind: EntryKind, size: u64, mtime_secs: u64) -> Entry {
        Entry {
            path: RelativePath::parse(path).unwrap(),
            kind,
            size,
            mtime: SystemTime::UNIX_EPOCH + Duration::from_secs(mtime_secs),
            mode: 0o644,
            symlink_target: None,
        }
    }

    struct Fixture {
        left: TempDir,
        right: TempDir,
        hasher: FileHasher,
        cache: DigestCache,
        cancel: CancelToken,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                left: TempDir::new().unwrap(),
                right: TempDir::new().unwrap(),
                hasher: FileHasher::new(HashAlgorithm::Strong),
                cache: DigestCache::new(),
                cancel: CancelToken::new(),
            }
        }

        fn classify(&mut self, left: Option<Entry>, right: Option<Entry>) -> Classified {
            let mut classifier = Classifier::new(
                self.left.path(),
                self.right.path(),
                &self.hasher,
                &mut self.cache,
                false,
                &self.cancel,
            );
            classifier.classify(left, right).unwrap()
        }
    }

    #[test]
    fn left_only_is_removed() {
        let mut fx = Fixture::new();
        let outcome = fx.classify(Some(entry("a", EntryKind::File, 1, 0)), None);
        assert!(matches!(outcome, Classified::Entry(DiffEntry::Removed { .. })));
    }

    #[test]
    fn right_only_is_added() {
        let mut fx = Fixture::new();
        let outcome = fx.classify(None, Some(entry("a", EntryKind::File, 1, 0)));
        assert!(matches!(outcome, Classified::Entry(DiffEntry::Added { .. })));
    }

    #[test]
    fn kind_mismatch_is_modified() {
        let mut fx = Fixture::new();
        let outcome = fx.classify(
            Some(entry("a", EntryKind::File, 1, 0)),
            Some(entry("a", EntryKind::Directory, 0, 0)),
        );
        match outcome {
            Classified::Entry(DiffEntry::Modified { reason, .. }) => {
                assert_eq!(reason, ChangeReason::KindChanged);
            }
            other => panic!("expected modified, got {other:?}"),
        }
    }

    #[test]
    fn paired_directories_are_unchanged() {
        let mut fx = Fixture::new();
        let outcome = fx.classify(
            Some(entry("d", EntryKind::Directory, 0, 0)),
            Some(entry("d", EntryKind::Directory, 0, 5)),
        );
        assert!(matches!(
            outcome,
            Classified::Entry(DiffEntry::Unchanged { reason: None, .. })
        ));
    }

    #[test]
    fn equal_metadata_skips_hashing() {
        let mut fx = Fixture::new();
        // Files deliberately absent on disk: matching size and mtime
        // must short-circuit before any read.
        let outcome = fx.classify(
            Some(entry("f", EntryKind::File, 10, 42)),
            Some(entry("f", EntryKind::File, 10, 42)),
        );
        assert!(matches!(
            outcome,
            Classified::Entry(DiffEntry::Unchanged { reason: None, .. })
        ));
        assert!(fx.cache.is_empty());
    }

    #[test]
    fn differing_content_is_modified() {
        let mut fx = Fixture::new();
        fs::write(fx.left.path().join("f"), b"one").unwrap();
        fs::write(fx.right.path().join("f"), b"two!").unwrap();
        let outcome = fx.classify(
            Some(entry("f", EntryKind::File, 3, 1)),
            Some(entry("f", EntryKind::File, 4, 2)),
        );
        match outcome {
            Classified::Entry(DiffEntry::Modified { reason, .. }) => {
                assert_eq!(reason, ChangeReason::ContentDiffered);
            }
            other => panic!("expected modified, got {other:?}"),
        }
    }

    #[test]
    fn touched_but_identical_content_is_unchanged_with_reason() {
        let mut fx = Fixture::new();
        fs::write(fx.left.path().join("f"), b"same").unwrap();
        fs::write(fx.right.path().join("f"), b"same").unwrap();
        let outcome = fx.classify(
            Some(entry("f", EntryKind::File, 4, 1)),
            Some(entry("f", EntryKind::File, 4, 99)),
        );
        match outcome {
            Classified::Entry(DiffEntry::Unchanged { reason, .. }) => {
                assert_eq!(reason, Some(ChangeReason::MetadataDifferedButContentSame));
            }
            other => panic!("expected unchanged, got {other:?}"),
        }
    }

    #[test]
    fn symlink_target_change_is_modified() {
        let mut fx = Fixture::new();
        let mut left = entry("l", EntryKind::Symlink, 0, 0);
        left.symlink_target = Some("old".into());
        let mut right = entry("l", EntryKind::Symlink, 0, 0);
        right.symlink_target = Some("new".into());
        let outcome = fx.classify(Some(left), Some(right));
        match outcome {
            Classified::Entry(DiffEntry::Modified { reason, .. }) => {
                assert_eq!(reason, ChangeReason::TargetChanged);
            }
            other => panic!("expected modified, got {other:?}"),
        }
    }

    #[test]
    fn permission_difference_needs_opt_in() {
        let mut fx = Fixture::new();
        let left = Entry {
            mode: 0o600,
            ..entry("f", EntryKind::File, 2, 7)
        };
        let right = Entry {
            mode: 0o644,
            ..entry("f", EntryKind::File, 2, 7)
        };

        let outcome = fx.classify(Some(left.clone()), Some(right.clone()));
        assert!(matches!(
            outcome,
            Classified::Entry(DiffEntry::Unchanged { .. })
        ));

        let mut classifier = Classifier::new(
            fx.left.path(),
            fx.right.path(),
            &fx.hasher,
            &mut fx.cache,
            true,
            &fx.cancel,
        );
        let outcome = classifier.classify(Some(left), Some(right)).unwrap();
        match outcome {
            Classified::Entry(DiffEntry::Modified { reason, .. }) => {
                assert_eq!(reason, ChangeReason::PermissionsChanged);
            }
            other => panic!("expected modified, got {other:?}"),
        }
    }

    #[test]
    fn content_change_outranks_permission_change() {
        let mut fx = Fixture::new();
        fs::write(fx.left.path().join("f"), b"old bytes").unwrap();
        fs::write(fx.right.path().join("f"), b"new stuff!").unwrap();
        let left = Entry {
            mode: 0o600,
            ..entry("f", EntryKind::File, 9, 1)
        };
        let right = Entry {
            mode: 0o644,
            ..entry("f", EntryKind::File, 10, 2)
        };

        let mut classifier = Classifier::new(
            fx.left.path(),
            fx.right.path(),
            &fx.hasher,
            &mut fx.cache,
            true,
            &fx.cancel,
        );
        let outcome = classifier.classify(Some(left), Some(right)).unwrap();
        match outcome {
            Classified::Entry(DiffEntry::Modified { reason, .. }) => {
                assert_eq!(reason, ChangeReason::ContentDiffered);
            }
            other => panic!("expected modified, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_file_reports_a_failure() {
        let mut fx = Fixture::new();
        fs::write(fx.right.path().join("f"), b"present").unwrap();
        // Left file missing entirely; digesting it fails.
        let outcome = fx.classify(
            Some(entry("f", EntryKind::File, 7, 1)),
            Some(entry("f", EntryKind::File, 7, 2)),
        );
        match outcome {
            Classified::Failed(side, record) => {
                assert_eq!(side, Side::Left);
                assert_eq!(record.path.to_string(), "f");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn cancellation_during_hashing_aborts() {
        let mut fx = Fixture::new();
        fs::write(fx.left.path().join("f"), b"abc").unwrap();
        fs::write(fx.right.path().join("f"), b"abcd").unwrap();
        fx.cancel.cancel();
        let mut classifier = Classifier::new(
            fx.left.path(),
            fx.right.path(),
            &fx.hasher,
            &mut fx.cache,
            false,
            &fx.cancel,
        );
        let result = classifier.classify(
            Some(entry("f", EntryKind::File, 3, 1)),
            Some(entry("f", EntryKind::File, 4, 2)),
        );
        assert!(matches!(result, Err(EngineError::Cancelled)));
    }
}
