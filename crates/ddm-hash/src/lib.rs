//! Content identity for the ddm diff engine.
//!
//! [`FileHasher`] streams a file through the configured digest function
//! in bounded chunks; whole files are never loaded into memory.
//! [`DigestCache`] memoizes digests per `(side, path)` within a single
//! diff run so a file is hashed at most once, and is an explicitly
//! passed handle, never ambient state.

pub mod cache;
pub mod error;
pub mod hasher;

pub use cache::DigestCache;
pub use error::{HashError, HashResult};
pub use hasher::FileHasher;
