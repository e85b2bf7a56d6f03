//! add command - Stage file contents

use std::path::PathBuf;

use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Stage each of `paths`, relative to the working directory.
pub fn add(ctx: &Context, paths: &[PathBuf]) -> Result<()> {
    let cwd = ctx.cwd()?;
    let mut repo = ctx.open_repo()?;

    for path in paths {
        let absolute = cwd.join(path);
        let id = repo
            .add(&absolute)
            .with_context(|| format!("Failed to stage {}", path.display()))?;
        if ctx.debug {
            output::print(
                format!("staged {} as {}", path.display(), output::short_id(&id)),
                ctx.verbosity(),
            );
        }
    }
    Ok(())
}
