//! Foundation types for the ddm directory diff engine.
//!
//! Everything here is a plain value type shared by the walker, the
//! content identifier, and the diff engine:
//!
//! - [`RelativePath`] -- normalized path relative to a comparison root,
//!   the common key for aligning two trees
//! - [`Entry`] / [`EntryKind`] -- one filesystem object observed during a walk
//! - [`ContentId`] / [`HashAlgorithm`] -- content identity digests
//! - [`Side`] -- which comparison root an observation came from
//! - [`CancelToken`] -- cooperative cancellation flag for a diff run

pub mod cancel;
pub mod content;
pub mod entry;
pub mod error;
pub mod path;

pub use cancel::CancelToken;
pub use content::{ContentId, HashAlgorithm};
pub use entry::{Entry, EntryKind, Side};
pub use error::TypeError;
pub use path::RelativePath;
