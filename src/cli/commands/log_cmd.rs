//! log command - Show first-parent history
//!
//! ```text
//! commit <id>
//! Merge: <parent> <parent2>
//! Author: Name <email>
//! Date:   2024-01-01T00:00:00+00:00
//!
//!     message
//! ```

use std::fmt::Write;

use crate::cli::Context;
use crate::repo::LogEntry;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Format one log entry, blank line included.
pub fn format_entry(entry: &LogEntry) -> String {
    let commit = &entry.commit;
    let mut out = String::new();
    let _ = writeln!(out, "commit {}", entry.id);
    if let (Some(p1), Some(p2)) = (&commit.parent, &commit.parent2) {
        let _ = writeln!(out, "Merge: {} {}", output::short_id(p1), output::short_id(p2));
    }
    let _ = writeln!(out, "Author: {}", commit.author);
    let _ = writeln!(out, "Date:   {}", commit.timestamp);
    out.push('\n');
    for line in commit.message.lines() {
        let _ = writeln!(out, "    {line}");
    }
    out.push('\n');
    out
}

/// Print history from HEAD, newest first.
pub fn log(ctx: &Context, max_count: Option<usize>) -> Result<()> {
    let repo = ctx.open_repo()?;
    let entries = repo.log(max_count).context("Failed to read history")?;

    if entries.is_empty() {
        output::print("No commits yet.", ctx.verbosity());
        return Ok(());
    }
    for entry in &entries {
        print!("{}", format_entry(entry));
    }
    Ok(())
}
