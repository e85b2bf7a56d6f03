//! commit command - Record staged changes

use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Commit tracked and staged files with `message`.
pub fn commit(ctx: &Context, message: &str) -> Result<()> {
    let mut repo = ctx.open_repo()?;
    let id = repo.commit(message).context("Failed to commit")?;

    let on = match repo.current_branch()? {
        Some(branch) => branch.to_string(),
        None => "detached HEAD".to_string(),
    };
    let subject = message.lines().next().unwrap_or_default();
    output::print(
        format!("[{on} {}] {subject}", output::short_id(&id)),
        ctx.verbosity(),
    );
    Ok(())
}
