//! tag command - List or create lightweight tags

use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// List tags, or create `name` at HEAD.
pub fn tag(ctx: &Context, name: Option<&str>) -> Result<()> {
    let repo = ctx.open_repo()?;

    match name {
        Some(name) => {
            let at = repo
                .create_tag(name)
                .with_context(|| format!("Failed to create tag '{name}'"))?;
            output::print(
                format!("Tagged {} as {name}", output::short_id(&at)),
                ctx.verbosity(),
            );
        }
        None => {
            for (name, _) in repo.tags()? {
                println!("{name}");
            }
        }
    }
    Ok(())
}
