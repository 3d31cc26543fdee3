//! Diff engine for ddm.
//!
//! [`compute_diff`] walks two directory trees, aligns entries by
//! relative path, classifies each path as added/removed/modified/
//! unchanged (optionally collapsing equal-content pairs into moves),
//! and returns an ordered [`DiffReport`]. The engine never mutates
//! either tree.
//!
//! # Key types
//!
//! - [`DiffConfig`] -- knobs for one run (symlinks, excludes, moves,
//!   hash algorithm, cancellation)
//! - [`DiffReport`] / [`DiffEntry`] / [`ChangeReason`] -- the result
//! - [`EngineError`] -- whole-operation failures; per-entry failures
//!   land in the report's error list instead

pub mod align;
mod classify;
pub mod config;
pub mod engine;
pub mod error;
mod moves;
pub mod report;

pub use align::{AlignItem, AlignedPair, Aligner};
pub use config::DiffConfig;
pub use engine::compute_diff;
pub use error::{EngineError, EngineResult};
pub use report::{ChangeReason, DiffEntry, DiffReport, DiffSummary, ErrorRecord};
