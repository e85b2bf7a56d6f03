//! init command - Create an empty repository

use crate::cli::Context;
use crate::repo::Repository;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Create a repository in the working directory.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `branch` - Initial branch name (defaults to `main`)
pub fn init(ctx: &Context, branch: Option<&str>) -> Result<()> {
    let cwd = ctx.cwd()?;
    let repo = Repository::init(&cwd, branch).context("Failed to initialize repository")?;

    output::print(
        format!(
            "Initialized empty kit repository in {}",
            repo.paths().kit_dir().display()
        ),
        ctx.verbosity(),
    );
    Ok(())
}
