//! Depth-first tree traversal with deterministic ordering.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::warn;

use ddm_types::{CancelToken, Entry, EntryKind, RelativePath};

use crate::error::{WalkErrorKind, WalkErrorRecord, WalkEvent};
use crate::filter::PathFilter;

/// Traversal configuration for one walk.
#[derive(Clone, Debug, Default)]
pub struct WalkOptions {
    /// When `true`, symlinks are resolved and symlinked directories are
    /// descended into (with cycle detection). When `false` (default),
    /// symlinks are reported as such and never followed.
    pub follow_symlinks: bool,
    /// Exclude patterns; excluded paths are skipped entirely.
    pub filter: PathFilter,
}

/// A pending directory: its relative path plus the sorted names of its
/// children not yet visited.
struct Frame {
    rel: RelativePath,
    names: Vec<OsString>,
    pos: usize,
}

/// Lazy, restartable enumeration of one directory tree.
///
/// Yields entries in depth-first preorder with siblings sorted by name,
/// which is exactly increasing [`RelativePath`] order. The root itself
/// is not yielded; callers validate it before constructing the walker.
/// Each walk starts from scratch; no state is shared between walks.
pub struct Walker {
    root: PathBuf,
    options: WalkOptions,
    cancel: CancelToken,
    stack: Vec<Frame>,
    /// Canonical paths of directories already entered. Only populated
    /// when following symlinks.
    visited: HashSet<PathBuf>,
    started: bool,
}

impl Walker {
    pub fn new(root: &Path, options: WalkOptions, cancel: CancelToken) -> Self {
        Self {
            root: root.to_path_buf(),
            options,
            cancel,
            stack: Vec::new(),
            visited: HashSet::new(),
            started: false,
        }
    }

    fn seed(&mut self) -> Option<WalkEvent> {
        if self.options.follow_symlinks {
            if let Ok(canonical) = fs::canonicalize(&self.root) {
                self.visited.insert(canonical);
            }
        }
        match read_child_names(&self.root) {
            Ok(names) => {
                self.stack.push(Frame {
                    rel: RelativePath::root(),
                    names,
                    pos: 0,
                });
                None
            }
            Err(err) => Some(WalkEvent::Error(WalkErrorRecord::from_io(
                RelativePath::root(),
                &err,
            ))),
        }
    }

    /// Visit one child of the frame on top of the stack. Returns `None`
    /// when the child is excluded (nothing to yield, nothing recorded).
    fn visit(&mut self, parent: &RelativePath, name: &OsStr) -> Option<WalkEvent> {
        let rel = match parent.join_os(name) {
            Ok(rel) => rel,
            Err(_) => {
                let lossy = name.to_string_lossy().into_owned();
                let rel = parent.join(&lossy).unwrap_or_else(|_| parent.clone());
                return Some(WalkEvent::Error(WalkErrorRecord::new(
                    rel,
                    WalkErrorKind::ReadError,
                    "file name is not valid UTF-8",
                )));
            }
        };
        let abs = rel.to_fs_path(&self.root);

        let lstat = match fs::symlink_metadata(&abs) {
            Ok(md) => md,
            Err(err) => {
                if self.options.filter.is_excluded_any(&rel) {
                    return None;
                }
                return Some(WalkEvent::Error(WalkErrorRecord::from_io(rel, &err)));
            }
        };

        let (kind, attrs, target) = if lstat.file_type().is_symlink() {
            if self.options.follow_symlinks {
                match fs::metadata(&abs) {
                    Ok(followed) => {
                        let kind = kind_of(&followed);
                        (kind, followed, None)
                    }
                    Err(err) => {
                        if self.options.filter.is_excluded_any(&rel) {
                            return None;
                        }
                        return Some(WalkEvent::Error(WalkErrorRecord::from_io(rel, &err)));
                    }
                }
            } else {
                match fs::read_link(&abs) {
                    Ok(target) => (
                        EntryKind::Symlink,
                        lstat,
                        Some(target.to_string_lossy().into_owned()),
                    ),
                    Err(err) => {
                        if self.options.filter.is_excluded_any(&rel) {
                            return None;
                        }
                        return Some(WalkEvent::Error(WalkErrorRecord::from_io(rel, &err)));
                    }
                }
            }
        } else {
            let kind = kind_of(&lstat);
            (kind, lstat, None)
        };

        let is_dir = kind == EntryKind::Directory;
        if self.options.filter.is_excluded(&rel, is_dir) {
            return None;
        }

        if kind == EntryKind::Other {
            warn!(path = %rel, "unsupported file kind, metadata only");
        }

        if is_dir {
            if self.options.follow_symlinks {
                match fs::canonicalize(&abs) {
                    Ok(canonical) => {
                        if !self.visited.insert(canonical) {
                            return Some(WalkEvent::Error(WalkErrorRecord::new(
                                rel,
                                WalkErrorKind::CycleDetected,
                                "symlink traversal revisits a directory",
                            )));
                        }
                    }
                    Err(err) => {
                        return Some(WalkEvent::Error(WalkErrorRecord::from_io(rel, &err)));
                    }
                }
            }
            match read_child_names(&abs) {
                Ok(names) => self.stack.push(Frame {
                    rel: rel.clone(),
                    names,
                    pos: 0,
                }),
                // An unlistable directory is recorded instead of yielded;
                // its contents are unknown, so no entry would be honest.
                Err(err) => return Some(WalkEvent::Error(WalkErrorRecord::from_io(rel, &err))),
            }
        }

        Some(WalkEvent::Entry(Entry {
            size: if kind == EntryKind::File { attrs.len() } else { 0 },
            mtime: attrs.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            mode: mode_bits(&attrs),
            path: rel,
            kind,
            symlink_target: target,
        }))
    }
}

impl Iterator for Walker {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<WalkEvent> {
        if !self.started {
            self.started = true;
            if let Some(event) = self.seed() {
                return Some(event);
            }
        }
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }
            let frame = self.stack.last_mut()?;
            let Some(name) = frame.names.get(frame.pos).cloned() else {
                self.stack.pop();
                continue;
            };
            frame.pos += 1;
            let parent = frame.rel.clone();
            if let Some(event) = self.visit(&parent, &name) {
                return Some(event);
            }
        }
    }
}

fn kind_of(md: &fs::Metadata) -> EntryKind {
    let ft = md.file_type();
    if ft.is_file() {
        EntryKind::File
    } else if ft.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::Other
    }
}

#[cfg(unix)]
fn mode_bits(md: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    md.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_bits(_md: &fs::Metadata) -> u32 {
    0
}

/// Read and name-sort a directory's children. Sorting here is what
/// makes the whole walk order deterministic.
fn read_child_names(dir: &Path) -> std::io::Result<Vec<OsString>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        names.push(entry?.file_name());
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    fn walk_paths(root: &Path, options: WalkOptions) -> Vec<String> {
        Walker::new(root, options, CancelToken::new())
            .filter_map(|event| match event {
                WalkEvent::Entry(entry) => Some(entry.path.to_string()),
                WalkEvent::Error(_) => None,
            })
            .collect()
    }

    fn walk_errors(root: &Path, options: WalkOptions) -> Vec<WalkErrorRecord> {
        Walker::new(root, options, CancelToken::new())
            .filter_map(|event| match event {
                WalkEvent::Error(record) => Some(record),
                WalkEvent::Entry(_) => None,
            })
            .collect()
    }

    #[test]
    fn yields_depth_first_sorted() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "b.txt", "b");
        write_file(dir.path(), "a/nested/deep.txt", "d");
        write_file(dir.path(), "a/one.txt", "1");
        write_file(dir.path(), "c/two.txt", "2");

        let paths = walk_paths(dir.path(), WalkOptions::default());
        assert_eq!(
            paths,
            vec![
                "a",
                "a/nested",
                "a/nested/deep.txt",
                "a/one.txt",
                "b.txt",
                "c",
                "c/two.txt",
            ]
        );
    }

    #[test]
    fn directory_contents_precede_dotted_sibling() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a/z", "z");
        write_file(dir.path(), "a.txt", "t");

        let paths = walk_paths(dir.path(), WalkOptions::default());
        assert_eq!(paths, vec!["a", "a/z", "a.txt"]);
    }

    #[test]
    fn walk_is_restartable_and_deterministic() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "x/1.txt", "1");
        write_file(dir.path(), "y.txt", "y");

        let first = walk_paths(dir.path(), WalkOptions::default());
        let second = walk_paths(dir.path(), WalkOptions::default());
        assert_eq!(first, second);
    }

    #[test]
    fn entries_carry_size_and_kind() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "f.txt", "hello");

        let events: Vec<_> = Walker::new(dir.path(), WalkOptions::default(), CancelToken::new())
            .collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            WalkEvent::Entry(entry) => {
                assert_eq!(entry.kind, EntryKind::File);
                assert_eq!(entry.size, 5);
            }
            WalkEvent::Error(record) => panic!("unexpected error: {record:?}"),
        }
    }

    #[test]
    fn excluded_directory_and_descendants_are_invisible() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "build/out.bin", "x");
        write_file(dir.path(), "src/main.c", "y");

        let options = WalkOptions {
            follow_symlinks: false,
            filter: PathFilter::from_patterns(["build"]).unwrap(),
        };
        let paths = walk_paths(dir.path(), options.clone());
        assert_eq!(paths, vec!["src", "src/main.c"]);
        assert!(walk_errors(dir.path(), options).is_empty());
    }

    #[test]
    fn excluded_glob_skips_files_anywhere() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "keep.txt", "k");
        write_file(dir.path(), "sub/drop.log", "l");

        let options = WalkOptions {
            follow_symlinks: false,
            filter: PathFilter::from_patterns(["*.log"]).unwrap(),
        };
        let paths = walk_paths(dir.path(), options);
        assert_eq!(paths, vec!["keep.txt", "sub"]);
    }

    #[test]
    fn cancelled_walker_yields_nothing() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.txt", "a");

        let cancel = CancelToken::new();
        cancel.cancel();
        let mut walker = Walker::new(dir.path(), WalkOptions::default(), cancel);
        assert!(walker.next().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_reported_not_followed_by_default() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "real/inner.txt", "i");
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();

        let events: Vec<_> = Walker::new(dir.path(), WalkOptions::default(), CancelToken::new())
            .collect();
        let link = events
            .iter()
            .find_map(|e| match e {
                WalkEvent::Entry(entry) if entry.path.to_string() == "link" => Some(entry),
                _ => None,
            })
            .expect("link entry");
        assert_eq!(link.kind, EntryKind::Symlink);
        assert!(link.symlink_target.as_deref().unwrap().ends_with("real"));
        // Nothing under the link is enumerated.
        assert!(!events.iter().any(|e| e.path().to_string() == "link/inner.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn followed_symlink_directory_is_descended() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "real/inner.txt", "i");
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("zlink")).unwrap();

        let options = WalkOptions {
            follow_symlinks: true,
            filter: PathFilter::empty(),
        };
        let paths = walk_paths(dir.path(), options);
        assert!(paths.contains(&"zlink".to_string()));
        assert!(paths.contains(&"zlink/inner.txt".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycle_is_detected_not_looped() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "top/file.txt", "f");
        std::os::unix::fs::symlink(dir.path().join("top"), dir.path().join("top/loop")).unwrap();

        let options = WalkOptions {
            follow_symlinks: true,
            filter: PathFilter::empty(),
        };
        let errors = walk_errors(dir.path(), options.clone());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, WalkErrorKind::CycleDetected);
        assert_eq!(errors[0].path.to_string(), "top/loop");

        let paths = walk_paths(dir.path(), options);
        assert_eq!(paths, vec!["top", "top/file.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directory_is_recorded_and_siblings_continue() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "locked/secret.txt", "s");
        write_file(dir.path(), "open/visible.txt", "v");
        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let events: Vec<_> = Walker::new(dir.path(), WalkOptions::default(), CancelToken::new())
            .collect();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let errors: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                WalkEvent::Error(record) => Some(record),
                _ => None,
            })
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.to_string(), "locked");
        assert_eq!(errors[0].kind, WalkErrorKind::PermissionDenied);

        let paths: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                WalkEvent::Entry(entry) => Some(entry.path.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(paths, vec!["open", "open/visible.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn broken_symlink_with_follow_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("dangling"))
            .unwrap();

        let options = WalkOptions {
            follow_symlinks: true,
            filter: PathFilter::empty(),
        };
        let errors = walk_errors(dir.path(), options);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.to_string(), "dangling");
        assert_eq!(errors[0].kind, WalkErrorKind::ReadError);
    }
}
