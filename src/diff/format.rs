//! diff::format
//!
//! Unified diff rendering.
//!
//! ```text
//! --- a/src/lib.rs
//! +++ b/src/lib.rs
//! @@ -1,3 +1,3 @@
//!  unchanged
//! -removed
//! +added
//! ```
//!
//! A missing side is written as `/dev/null`.

use std::fmt::Write;

use super::line::Hunk;
use super::tree::FileDiff;

/// Render one hunk, header included.
pub fn render_hunk(hunk: &Hunk) -> String {
    let mut out = hunk.header();
    out.push('\n');
    for line in &hunk.lines {
        out.push(line.kind.prefix());
        out.push_str(&line.text);
        out.push('\n');
    }
    out
}

/// Render one file diff. Files without hunks render as nothing.
pub fn render_file(diff: &FileDiff) -> String {
    if diff.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    let _ = match &diff.old_path {
        Some(path) => writeln!(out, "--- a/{path}"),
        None => writeln!(out, "--- /dev/null"),
    };
    let _ = match &diff.new_path {
        Some(path) => writeln!(out, "+++ b/{path}"),
        None => writeln!(out, "+++ /dev/null"),
    };
    for hunk in &diff.hunks {
        out.push_str(&render_hunk(hunk));
    }
    out
}

/// Render a sequence of file diffs.
pub fn render(diffs: &[FileDiff]) -> String {
    diffs.iter().map(render_file).collect()
}
