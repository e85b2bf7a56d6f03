//! checkout command - Switch branches or detach HEAD

use crate::cli::Context;
use crate::repo::CheckoutTarget;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Check out a branch, tag or commit.
pub fn checkout(ctx: &Context, target: &str) -> Result<()> {
    let mut repo = ctx.open_repo()?;
    let outcome = repo
        .checkout(target)
        .with_context(|| format!("Failed to check out '{target}'"))?;

    let message = match outcome {
        CheckoutTarget::Branch(branch) => format!("Switched to branch '{branch}'"),
        CheckoutTarget::Detached(id) => format!("HEAD is now at {} (detached)", output::short_id(&id)),
    };
    output::print(message, ctx.verbosity());
    Ok(())
}
