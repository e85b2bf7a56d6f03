//! verify command - Check repository integrity

use crate::cli::Context;
use crate::ui::output;
use anyhow::{bail, Context as _, Result};

/// Re-hash every object and check reference targets.
///
/// Fails when anything is wrong, after listing every finding.
pub fn verify(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    let report = repo.verify().context("Failed to verify repository")?;

    for id in &report.objects.corrupt {
        println!("corrupt object {id}");
    }
    for path in &report.objects.stray {
        println!("stray file {}", path.display());
    }
    for (name, id) in &report.dangling {
        println!("dangling reference {name} -> {}", output::short_id(id));
    }

    if !report.is_clean() {
        bail!(
            "repository check failed: {} corrupt, {} stray, {} dangling",
            report.objects.corrupt.len(),
            report.objects.stray.len(),
            report.dangling.len()
        );
    }

    output::print(
        format!("{} ok", output::count(report.objects.objects, "object")),
        ctx.verbosity(),
    );
    Ok(())
}
