//! Error types for digest computation.

/// Errors from hashing one file.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// The file could not be opened or read.
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    /// The byte count read disagrees with the size recorded at walk
    /// time. Best-effort detection of concurrent external mutation.
    #[error("file size changed during read: expected {expected} bytes, read {actual}")]
    SizeChanged { expected: u64, actual: u64 },

    /// The diff run was cancelled while reading.
    #[error("hashing cancelled")]
    Cancelled,
}

/// Result alias for digest operations.
pub type HashResult<T> = Result<T, HashError>;
