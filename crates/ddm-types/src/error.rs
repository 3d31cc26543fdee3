//! Error types for the foundation crate.

/// Errors from constructing foundation values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// A path component was empty, `.`/`..`, or contained a separator.
    #[error("invalid path component: {0:?}")]
    InvalidComponent(String),

    /// A file name was not valid UTF-8 and cannot become a path component.
    #[error("path component is not valid UTF-8: {0}")]
    NotUtf8(String),
}
