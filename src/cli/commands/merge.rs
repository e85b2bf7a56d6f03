//! merge command - Merge another branch into the current one
//!
//! Conflicts are reported, not raised: a merge that stops with conflicts
//! still exits successfully.

use crate::cli::Context;
use crate::merge::engine::{MergeOutcome, MergeStatus};
use crate::merge::strategy::{MergeOptions, MergeStrategy};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Merge `branch` into the current branch.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `branch` - Branch to merge in
/// * `strategy` - Conflict strategy (config default if `None`)
/// * `no_commit` - Stage the result instead of committing
/// * `message` - Merge commit message
/// * `semantic` - Consult the similarity oracle on conflicts in source files
pub fn merge(
    ctx: &Context,
    branch: &str,
    strategy: Option<MergeStrategy>,
    no_commit: bool,
    message: Option<String>,
    semantic: bool,
) -> Result<()> {
    let mut repo = ctx.open_repo()?;
    let options = MergeOptions {
        strategy: strategy.unwrap_or_else(|| repo.config().merge_strategy()),
        no_commit,
        message,
        semantic: semantic || repo.config().semantic_merge(),
    };

    let outcome = repo
        .merge(branch, &options)
        .with_context(|| format!("Failed to merge '{branch}'"))?;
    report(ctx, branch, &options, &outcome);
    Ok(())
}

fn report(ctx: &Context, branch: &str, options: &MergeOptions, outcome: &MergeOutcome) {
    let v = ctx.verbosity();
    match outcome.status {
        MergeStatus::UpToDate => output::print("Already up to date.", v),
        MergeStatus::FastForward => output::print(
            format!("Fast-forward to {}", output::short_id(&outcome.head)),
            v,
        ),
        MergeStatus::Clean => concluded(branch, outcome, v),
        MergeStatus::AutoResolved => {
            output::print(
                format!(
                    "Resolved {} using strategy {}:",
                    output::count(outcome.conflicts.len(), "conflict"),
                    options.strategy
                ),
                v,
            );
            let paths: Vec<_> = outcome.conflicts.iter().map(|c| &c.path).collect();
            output::print(output::format_list(&paths, "  "), v);
            concluded(branch, outcome, v);
        }
        MergeStatus::PartiallyMerged => {
            for conflict in outcome.unresolved() {
                output::warn(
                    format!("CONFLICT (content): {} kept our version", conflict.path),
                    v,
                );
            }
            concluded(branch, outcome, v);
        }
        MergeStatus::Conflicted => {
            // Shown even with --quiet: the working tree now holds markers.
            let unresolved: Vec<_> = outcome.unresolved().map(|c| &c.path).collect();
            println!(
                "Automatic merge stopped with {}:",
                output::count(unresolved.len(), "conflict")
            );
            for path in unresolved {
                println!("CONFLICT (content): {path}");
            }
            println!("Fix the conflicts, 'kit add' the files, then 'kit commit'.");
        }
    }
}

fn concluded(branch: &str, outcome: &MergeOutcome, v: output::Verbosity) {
    match &outcome.commit {
        Some(id) => output::print(
            format!("Merged '{branch}' into {} as {}", outcome.ours_branch, output::short_id(id)),
            v,
        ),
        None => output::print(
            "Merge result staged; run 'kit commit' to conclude the merge.",
            v,
        ),
    }
}
