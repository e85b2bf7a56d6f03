//! diff
//!
//! Line and tree differencing.
//!
//! - [`line`] - LCS edit scripts, hunks and hunk application
//! - [`tree`] - Path classification between two trees, per-file diffs
//! - [`format`] - Unified diff text

pub mod format;
pub mod line;
pub mod tree;

pub use line::{diff_lines, Hunk, HunkLine, LineKind, PatchError};
pub use tree::{diff_trees, ChangeKind, FileDiff, TreeChange};
