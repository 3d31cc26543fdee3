use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// A path relative to a comparison root, stored as a normalized sequence
/// of UTF-8 components.
///
/// Components never contain separators and never equal `.` or `..`, so
/// two `RelativePath`s naming the same tree position are always equal.
/// Ordering is component-wise lexicographic, which means a depth-first
/// walk that sorts siblings by name yields paths in strictly increasing
/// order: a directory sorts before everything beneath it, and `a/z`
/// sorts before a sibling named `a.txt` only if `a < a.txt` as
/// components. This is the ordering the aligner's merge-join and the
/// final report rely on.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath(Vec<String>);

impl RelativePath {
    /// The empty path, naming the comparison root itself.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build from components, validating each one.
    pub fn from_components<I, S>(components: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parts = Vec::new();
        for component in components {
            let component = component.into();
            validate_component(&component)?;
            parts.push(component);
        }
        Ok(Self(parts))
    }

    /// Parse a `/`-separated path string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        Self::from_components(s.split('/'))
    }

    /// Extend this path with one more component.
    pub fn join(&self, component: &str) -> Result<Self, TypeError> {
        validate_component(component)?;
        let mut parts = self.0.clone();
        parts.push(component.to_string());
        Ok(Self(parts))
    }

    /// Extend this path with a file name as reported by the OS.
    ///
    /// Fails if the name is not valid UTF-8.
    pub fn join_os(&self, name: &OsStr) -> Result<Self, TypeError> {
        let component = name
            .to_str()
            .ok_or_else(|| TypeError::NotUtf8(name.to_string_lossy().into_owned()))?;
        self.join(component)
    }

    /// The path components, in order.
    pub fn components(&self) -> &[String] {
        &self.0
    }

    /// Number of components.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if this is the root (empty) path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The final component, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Resolve against a filesystem root.
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for component in &self.0 {
            path.push(component);
        }
        path
    }
}

fn validate_component(component: &str) -> Result<(), TypeError> {
    if component.is_empty()
        || component == "."
        || component == ".."
        || component.contains('/')
        || component.contains('\\')
    {
        return Err(TypeError::InvalidComponent(component.to_string()));
    }
    Ok(())
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl fmt::Debug for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelativePath({})", self.0.join("/"))
    }
}

impl Serialize for RelativePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RelativePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(D::Error::custom)
    }
}
