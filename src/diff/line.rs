//! diff::line
//!
//! Line-level differ based on an exact longest common subsequence.
//!
//! # Algorithm
//!
//! 1. Split both inputs into lines (a trailing newline does not add an
//!    empty final line).
//! 2. Fill an `(n+1) x (m+1)` table of suffix LCS lengths.
//! 3. Walk the table from the top-left to produce an edit script of
//!    [`EditKind::Unchanged`], [`EditKind::Delete`] and [`EditKind::Insert`]
//!    operations, preferring deletions before insertions on ties.
//! 4. Group changes into [`Hunk`]s with `context` unchanged lines on each
//!    side. Two changes whose context windows touch or overlap share a hunk.
//!
//! Time and space are O(n·m), which is fine for source files and not meant
//! for very large inputs.
//!
//! # Invariants
//!
//! - `diff_lines(x, x, _)` is empty
//! - applying `diff_lines(a, b, c)` to the lines of `a` yields the lines of `b`
//!
//! # Example
//!
//! ```
//! use kitwork::diff::line::{apply_hunks, diff_lines, split_lines};
//!
//! let old = "a\nb\nc\n";
//! let new = "a\nB\nc\n";
//! let hunks = diff_lines(old, new, 3);
//! assert_eq!(hunks.len(), 1);
//! assert_eq!(hunks[0].header(), "@@ -1,3 +1,3 @@");
//!
//! let rebuilt = apply_hunks(&split_lines(old), &hunks).unwrap();
//! assert_eq!(rebuilt, split_lines(new));
//! ```

use thiserror::Error;

/// Kind of a single edit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Insert,
    Delete,
    Unchanged,
}

/// One step of an edit script, indexed into both inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit<'a> {
    pub kind: EditKind,
    /// Index into the old lines (absent for inserts).
    pub old_index: Option<usize>,
    /// Index into the new lines (absent for deletes).
    pub new_index: Option<usize>,
    pub line: &'a str,
}

/// Tag of a line inside a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Added,
    Removed,
    Context,
}

impl LineKind {
    /// Unified diff prefix character.
    pub fn prefix(self) -> char {
        match self {
            Self::Added => '+',
            Self::Removed => '-',
            Self::Context => ' ',
        }
    }
}

/// A tagged line of a hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkLine {
    pub kind: LineKind,
    pub text: String,
}

/// A contiguous changed region plus surrounding context.
///
/// Starts are 1-based. A side with length 0 reports the line number *after*
/// which the change sits (0 for the top of the file), as unified diffs do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    /// `@@ -a,b +c,d @@`
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_len, self.new_start, self.new_len
        )
    }

    pub fn added(&self) -> usize {
        self.count(LineKind::Added)
    }

    pub fn removed(&self) -> usize {
        self.count(LineKind::Removed)
    }

    fn count(&self, kind: LineKind) -> usize {
        self.lines.iter().filter(|l| l.kind == kind).count()
    }
}

/// Errors from applying hunks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    /// A context or removed line does not match the input.
    #[error("hunk {hunk} does not apply at line {line}: expected {expected:?}, found {found:?}")]
    Mismatch {
        hunk: usize,
        line: usize,
        expected: String,
        found: Option<String>,
    },

    /// Hunks overlap or run past the end of the input.
    #[error("hunk {hunk} is out of order or out of range")]
    OutOfRange { hunk: usize },
}

/// Split content into lines; a trailing newline does not yield an empty line.
pub fn split_lines(content: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = content.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}

/// Join lines back into content, terminating every line with `\n`.
pub fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out
}

/// Compute a minimal edit script turning `old` into `new`.
pub fn edit_script<'a>(old: &[&'a str], new: &[&'a str]) -> Vec<Edit<'a>> {
    let (n, m) = (old.len(), new.len());
    let width = m + 1;
    // lcs[i * width + j] = LCS length of old[i..] and new[j..]
    let mut lcs = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i * width + j] = if old[i] == new[j] {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let mut edits = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (0, 0);
    while i < n || j < m {
        if i < n && j < m && old[i] == new[j] {
            edits.push(Edit {
                kind: EditKind::Unchanged,
                old_index: Some(i),
                new_index: Some(j),
                line: old[i],
            });
            i += 1;
            j += 1;
        } else if i < n && (j == m || lcs[(i + 1) * width + j] >= lcs[i * width + j + 1]) {
            edits.push(Edit {
                kind: EditKind::Delete,
                old_index: Some(i),
                new_index: None,
                line: old[i],
            });
            i += 1;
        } else {
            edits.push(Edit {
                kind: EditKind::Insert,
                old_index: None,
                new_index: Some(j),
                line: new[j],
            });
            j += 1;
        }
    }
    edits
}

/// Group an edit script into hunks with `context` lines of context.
pub fn group_hunks(edits: &[Edit<'_>], context: usize) -> Vec<Hunk> {
    // (first change, last change) edit indices per hunk
    let mut groups: Vec<(usize, usize)> = Vec::new();
    for (k, edit) in edits.iter().enumerate() {
        if edit.kind == EditKind::Unchanged {
            continue;
        }
        match groups.last_mut() {
            Some(last) if k - last.1 - 1 <= context.saturating_mul(2) => last.1 = k,
            _ => groups.push((k, k)),
        }
    }

    groups
        .into_iter()
        .map(|(first, last)| {
            let start = first.saturating_sub(context);
            let end = last.saturating_add(context).saturating_add(1).min(edits.len());
            build_hunk(edits, start, end)
        })
        .collect()
}

fn build_hunk(edits: &[Edit<'_>], start: usize, end: usize) -> Hunk {
    let before = &edits[..start];
    let old_before = before.iter().filter(|e| e.kind != EditKind::Insert).count();
    let new_before = before.iter().filter(|e| e.kind != EditKind::Delete).count();

    let lines: Vec<HunkLine> = edits[start..end]
        .iter()
        .map(|e| HunkLine {
            kind: match e.kind {
                EditKind::Insert => LineKind::Added,
                EditKind::Delete => LineKind::Removed,
                EditKind::Unchanged => LineKind::Context,
            },
            text: e.line.to_string(),
        })
        .collect();

    let old_len = lines.iter().filter(|l| l.kind != LineKind::Added).count();
    let new_len = lines.iter().filter(|l| l.kind != LineKind::Removed).count();
    let start_of = |before: usize, len: usize| if len == 0 { before } else { before + 1 };

    Hunk {
        old_start: start_of(old_before, old_len),
        old_len,
        new_start: start_of(new_before, new_len),
        new_len,
        lines,
    }
}

/// Diff two contents line by line.
pub fn diff_lines(old: &str, new: &str, context: usize) -> Vec<Hunk> {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    let edits = edit_script(&old_lines, &new_lines);
    group_hunks(&edits, context)
}

/// Apply hunks produced from `old` back onto `old`.
///
/// # Errors
///
/// Returns [`PatchError`] if a context or removed line does not match, or if
/// hunks are out of order.
pub fn apply_hunks<S: AsRef<str>>(old: &[S], hunks: &[Hunk]) -> Result<Vec<String>, PatchError> {
    let mut out: Vec<String> = Vec::with_capacity(old.len());
    let mut pos = 0;

    for (index, hunk) in hunks.iter().enumerate() {
        let hunk_pos = if hunk.old_len == 0 {
            hunk.old_start
        } else {
            hunk.old_start.saturating_sub(1)
        };
        if hunk_pos < pos || hunk_pos > old.len() {
            return Err(PatchError::OutOfRange { hunk: index });
        }
        out.extend(old[pos..hunk_pos].iter().map(|l| l.as_ref().to_string()));
        pos = hunk_pos;

        for line in &hunk.lines {
            match line.kind {
                LineKind::Added => out.push(line.text.clone()),
                LineKind::Context | LineKind::Removed => {
                    let found = old.get(pos).map(|l| l.as_ref());
                    if found != Some(line.text.as_str()) {
                        return Err(PatchError::Mismatch {
                            hunk: index,
                            line: pos + 1,
                            expected: line.text.clone(),
                            found: found.map(str::to_string),
                        });
                    }
                    if line.kind == LineKind::Context {
                        out.push(line.text.clone());
                    }
                    pos += 1;
                }
            }
        }
    }

    out.extend(old[pos..].iter().map(|l| l.as_ref().to_string()));
    Ok(out)
}
