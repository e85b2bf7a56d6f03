//! merge
//!
//! Three-way merging of histories, trees and files.
//!
//! # Modules
//!
//! - [`strategy`] - closed set of conflict strategies and per-merge options
//! - [`file`] - line-level three-way merge and conflict markers
//! - [`tree`] - path-level three-way merge
//! - [`engine`] - orchestration: refs, merge base, fast-forward, commit

pub mod engine;
pub mod file;
pub mod strategy;
pub mod tree;

pub use engine::{MergeEngine, MergeError, MergeOutcome, MergePhase, MergeStatus};
pub use file::{merge_files, FileMergeOutcome};
pub use strategy::{MergeOptions, MergeStrategy, UnsupportedStrategy};
pub use tree::{MergeConflict, TreeMerge, TreeMerger};
