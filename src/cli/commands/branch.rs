//! branch command - List or create branches

use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// List branches, marking the current one, or create `name` at HEAD.
pub fn branch(ctx: &Context, name: Option<&str>) -> Result<()> {
    let repo = ctx.open_repo()?;

    if let Some(name) = name {
        let at = repo
            .create_branch(name)
            .with_context(|| format!("Failed to create branch '{name}'"))?;
        output::print(
            format!("Created branch {name} at {}", output::short_id(&at)),
            ctx.verbosity(),
        );
        return Ok(());
    }

    for info in repo.branches()? {
        let marker = if info.current { '*' } else { ' ' };
        println!("{marker} {} {}", info.name, output::short_id(&info.tip));
    }
    Ok(())
}
