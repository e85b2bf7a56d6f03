//! merge::file
//!
//! Three-way merge of file contents.
//!
//! # Algorithm
//!
//! Each side is diffed against the base with the LCS edit script from
//! [`crate::diff::line`], and every run of non-unchanged edits becomes a
//! [`Change`]: "replace base lines `start..end` with `lines`".
//!
//! - A change made identically on both sides counts once.
//! - Two changes collide when their base ranges overlap, when an insertion
//!   lands strictly inside the other side's range, or when both sides insert
//!   at the same position.
//! - With no collisions, all changes are applied to the base in position
//!   order. Edits that only touch each other merge cleanly.
//! - With any collision the file is in conflict and the strategy decides:
//!   `ours`/`theirs` take that side whole, `auto`/`manual` produce a
//!   marker block holding both full versions.
//!
//! # Example
//!
//! ```
//! use kitwork::merge::file::{merge_files, FileMergeOutcome};
//! use kitwork::merge::strategy::MergeStrategy;
//!
//! let merged = merge_files("a\nb\nc\n", "a\nB\nc\n", "a\nb\nC\n", MergeStrategy::Auto);
//! assert_eq!(merged, FileMergeOutcome::Clean("a\nB\nC\n".to_string()));
//! ```

use crate::diff::line::{edit_script, join_lines, split_lines, EditKind};
use crate::merge::strategy::MergeStrategy;
use crate::similarity::{is_source_path, SimilarityOracle};

pub const OURS_MARKER: &str = "<<<<<<< OURS";
pub const SEPARATOR_MARKER: &str = "=======";
pub const THEIRS_MARKER: &str = ">>>>>>> THEIRS";

/// Oracle score above which two additions without a base count as the same.
const ADDED_SIMILARITY: f64 = 0.9;
/// Oracle score above which two edits of a base count as the same.
const EDITED_SIMILARITY: f64 = 0.8;

/// Result of merging one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileMergeOutcome {
    /// Edits did not collide.
    Clean(String),
    /// Edits collided and one side was chosen.
    Resolved(String),
    /// Edits collided and were left for the user; the content holds markers.
    Conflicted(String),
}

impl FileMergeOutcome {
    pub fn content(&self) -> &str {
        match self {
            Self::Clean(c) | Self::Resolved(c) | Self::Conflicted(c) => c,
        }
    }

    /// Whether the edits collided, resolved or not.
    pub fn had_conflict(&self) -> bool {
        !matches!(self, Self::Clean(_))
    }
}

/// One side's replacement of a base range.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Change<'a> {
    start: usize,
    end: usize,
    lines: Vec<&'a str>,
}

impl Change<'_> {
    fn is_insertion(&self) -> bool {
        self.start == self.end
    }

    fn collides(&self, other: &Change<'_>) -> bool {
        match (self.is_insertion(), other.is_insertion()) {
            (true, true) => self.start == other.start,
            (true, false) => other.start < self.start && self.start < other.end,
            (false, true) => self.start < other.start && other.start < self.end,
            (false, false) => self.start < other.end && other.start < self.end,
        }
    }
}

/// Runs of edits turning `base` into `side`, as base-range replacements.
fn changes<'a>(base: &[&'a str], side: &[&'a str]) -> Vec<Change<'a>> {
    let mut out = Vec::new();
    let mut current: Option<Change<'a>> = None;
    let mut pos = 0;

    for edit in edit_script(base, side) {
        match edit.kind {
            EditKind::Unchanged => {
                if let Some(mut change) = current.take() {
                    change.end = pos;
                    out.push(change);
                }
                pos += 1;
            }
            EditKind::Delete => {
                current.get_or_insert_with(|| Change {
                    start: pos,
                    end: pos,
                    lines: Vec::new(),
                });
                pos += 1;
            }
            EditKind::Insert => {
                current
                    .get_or_insert_with(|| Change {
                        start: pos,
                        end: pos,
                        lines: Vec::new(),
                    })
                    .lines
                    .push(edit.line);
            }
        }
    }
    if let Some(mut change) = current {
        change.end = pos;
        out.push(change);
    }
    out
}

/// Merge non-colliding changes into the base, or `None` on any collision.
fn merge_lines<'a>(base: &[&'a str], ours: &[&'a str], theirs: &[&'a str]) -> Option<Vec<&'a str>> {
    let ours = changes(base, ours);
    let mut theirs = changes(base, theirs);

    theirs.retain(|t| !ours.contains(t));
    if ours.iter().any(|o| theirs.iter().any(|t| o.collides(t))) {
        return None;
    }

    let mut all: Vec<Change<'a>> = ours.into_iter().chain(theirs).collect();
    all.sort_by_key(|c| (c.start, c.end));

    let mut merged = Vec::with_capacity(base.len());
    let mut pos = 0;
    for change in all {
        merged.extend_from_slice(&base[pos..change.start]);
        merged.extend(change.lines);
        pos = change.end;
    }
    merged.extend_from_slice(&base[pos..]);
    Some(merged)
}

fn ensure_newline(content: &str) -> String {
    if content.is_empty() || content.ends_with('\n') {
        content.to_string()
    } else {
        format!("{content}\n")
    }
}

/// Marker block around the full content of both sides.
///
/// ```
/// use kitwork::merge::file::conflict_markers;
///
/// assert_eq!(
///     conflict_markers("y\n", "z\n"),
///     "<<<<<<< OURS\ny\n=======\nz\n>>>>>>> THEIRS\n"
/// );
/// ```
pub fn conflict_markers(ours: &str, theirs: &str) -> String {
    format!(
        "{OURS_MARKER}\n{}{SEPARATOR_MARKER}\n{}{THEIRS_MARKER}\n",
        ensure_newline(ours),
        ensure_newline(theirs)
    )
}

/// Settle a collision according to `strategy`.
fn resolve_conflict(ours: &str, theirs: &str, strategy: MergeStrategy) -> FileMergeOutcome {
    match strategy {
        MergeStrategy::Ours => FileMergeOutcome::Resolved(ours.to_string()),
        MergeStrategy::Theirs => FileMergeOutcome::Resolved(theirs.to_string()),
        MergeStrategy::Auto | MergeStrategy::Manual => {
            FileMergeOutcome::Conflicted(conflict_markers(ours, theirs))
        }
    }
}

/// Three-way merge of `ours` and `theirs` against `base`.
pub fn merge_files(base: &str, ours: &str, theirs: &str, strategy: MergeStrategy) -> FileMergeOutcome {
    if ours == theirs {
        return FileMergeOutcome::Clean(ours.to_string());
    }

    let base_lines = split_lines(base);
    let our_lines = split_lines(ours);
    let their_lines = split_lines(theirs);

    match merge_lines(&base_lines, &our_lines, &their_lines) {
        Some(merged) => {
            let mut content = join_lines(&merged);
            // The final newline merges like a line: a one-sided change wins.
            let terminated = |s: &str| s.is_empty() || s.ends_with('\n');
            let newline = if terminated(ours) == terminated(base) {
                terminated(theirs)
            } else {
                terminated(ours)
            };
            if !newline {
                content.pop();
            }
            FileMergeOutcome::Clean(content)
        }
        None => resolve_conflict(ours, theirs, strategy),
    }
}

/// Ask the oracle to settle a collision in a source file.
///
/// - Without a base (both sides added the file), a score above 0.9 keeps
///   the longer side.
/// - With a base, an ours/theirs score above 0.8 keeps the side that moved
///   further from the base.
///
/// Returns `None` when the path is not source code, the oracle fails, or
/// the sides are not similar enough.
pub fn semantic_resolution(
    oracle: &dyn SimilarityOracle,
    path: &str,
    base: &str,
    ours: &str,
    theirs: &str,
) -> Option<String> {
    if !is_source_path(path) {
        return None;
    }

    let score = |a: &str, b: &str| match oracle.similarity(a, b) {
        Ok(s) => Some(s.score),
        Err(e) => {
            tracing::warn!(path, "similarity oracle failed, falling back: {e}");
            None
        }
    };

    if base.is_empty() {
        if score(ours, theirs)? > ADDED_SIMILARITY {
            let longer = if ours.len() >= theirs.len() { ours } else { theirs };
            return Some(longer.to_string());
        }
        return None;
    }

    if score(ours, theirs)? > EDITED_SIMILARITY {
        let ours_to_base = score(base, ours)?;
        let theirs_to_base = score(base, theirs)?;
        let pick = if ours_to_base < theirs_to_base { ours } else { theirs };
        return Some(pick.to_string());
    }
    None
}

/// [`merge_files`], letting the oracle settle collisions in source files.
///
/// Only `auto` consults the oracle: `manual` never auto-resolves and
/// `ours`/`theirs` have already picked a side.
pub fn merge_files_with_oracle(
    oracle: &dyn SimilarityOracle,
    path: &str,
    base: &str,
    ours: &str,
    theirs: &str,
    strategy: MergeStrategy,
) -> FileMergeOutcome {
    let plain = merge_files(base, ours, theirs, strategy);
    if !plain.had_conflict() || strategy != MergeStrategy::Auto {
        return plain;
    }
    match semantic_resolution(oracle, path, base, ours, theirs) {
        Some(content) => {
            tracing::debug!(path, "collision settled by similarity oracle");
            FileMergeOutcome::Resolved(content)
        }
        None => plain,
    }
}
