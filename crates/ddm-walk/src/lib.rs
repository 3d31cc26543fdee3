//! Deterministic directory tree walker for ddm.
//!
//! [`Walker`] enumerates one tree depth-first with siblings sorted by
//! name, so the event order depends only on tree content, never on the
//! filesystem's iteration order. Per-entry failures (permission denied,
//! I/O errors, symlink cycles) become [`WalkErrorRecord`] events and the
//! walk continues with the remaining paths; nothing short of
//! cancellation aborts a walk.
//!
//! Recursion depth is bounded by an explicit stack of directory frames,
//! not the call stack.

pub mod error;
pub mod filter;
pub mod walker;

pub use error::{FilterError, WalkErrorKind, WalkErrorRecord, WalkEvent};
pub use filter::PathFilter;
pub use walker::{WalkOptions, Walker};
