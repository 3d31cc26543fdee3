//! Exclude-pattern matching against relative paths.

use std::path::Path;
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use ddm_types::RelativePath;

use crate::error::FilterError;

/// Compiled exclude patterns, gitignore-style.
///
/// Patterns match against the rendered relative path: `*.log` matches
/// by basename anywhere in the tree, `build/` matches only directories,
/// `docs/internal` anchors to the root. An excluded directory is never
/// descended into, so its descendants never surface at all.
#[derive(Clone, Debug, Default)]
pub struct PathFilter {
    matcher: Option<Arc<Gitignore>>,
}

impl PathFilter {
    /// A filter that excludes nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile a set of patterns. Fails on the first unparsable one.
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns = patterns.into_iter().peekable();
        if patterns.peek().is_none() {
            return Ok(Self::empty());
        }

        let mut builder = GitignoreBuilder::new("");
        for pattern in patterns {
            let pattern = pattern.as_ref();
            builder
                .add_line(None, pattern)
                .map_err(|source| FilterError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })?;
        }
        let matcher = builder.build()?;
        Ok(Self {
            matcher: Some(Arc::new(matcher)),
        })
    }

    /// Returns `true` if the path matches an exclude pattern.
    pub fn is_excluded(&self, path: &RelativePath, is_dir: bool) -> bool {
        match &self.matcher {
            None => false,
            Some(matcher) => {
                let rendered = path.to_string();
                matcher.matched(Path::new(&rendered), is_dir).is_ignore()
            }
        }
    }

    /// Returns `true` if the path matches regardless of whether it is a
    /// directory. Used for paths whose kind could not be determined.
    pub fn is_excluded_any(&self, path: &RelativePath) -> bool {
        self.is_excluded(path, false) || self.is_excluded(path, true)
    }
}
