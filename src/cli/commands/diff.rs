//! diff command - Show changes between revisions, files and the working tree
//!
//! Each argument is tried as a revision first, then as a path relative to
//! the working directory. Two plain files can be compared outside any
//! repository.

use crate::cli::Context;
use crate::core::config::schema::MAX_CONTEXT_LINES;
use crate::core::config::Config;
use crate::diff::format::render;
use crate::diff::tree::FileDiff;
use crate::repo::{diff_files, Repository, RepoError};
use anyhow::{anyhow, bail, Context as _, Result};

/// Show a unified diff.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `context` - Unchanged lines around each change (config default if `None`)
/// * `left`, `right` - Revisions or paths
pub fn diff(ctx: &Context, context: Option<usize>, left: Option<&str>, right: Option<&str>) -> Result<()> {
    let cwd = ctx.cwd()?;
    let repo = match Repository::discover(&cwd) {
        Ok(repo) => Some(repo),
        Err(RepoError::NotARepository { .. }) => None,
        Err(e) => return Err(e).context("Failed to open repository"),
    };

    let context = match context {
        Some(n) => n,
        None => match &repo {
            Some(repo) => repo.config().context_lines(),
            None => Config::load(None)?.context_lines(),
        },
    };
    if context > MAX_CONTEXT_LINES {
        bail!("--context must be at most {MAX_CONTEXT_LINES}");
    }

    let in_repo = || {
        repo.as_ref()
            .ok_or_else(|| anyhow!("not a kit repository: {}", cwd.display()))
    };
    let is_rev = |arg: &str| {
        repo.as_ref()
            .is_some_and(|r| r.resolve_revision(arg).is_ok())
    };
    let is_file = |arg: &str| cwd.join(arg).is_file();

    let diffs: Vec<FileDiff> = match (left, right) {
        (None, None) => in_repo()?.diff_worktree("HEAD", context)?,
        (Some(rev), None) if is_rev(rev) => in_repo()?.diff_worktree(rev, context)?,
        (Some(path), None) if is_file(path) => {
            vec![in_repo()?.diff_path("HEAD", &cwd.join(path), context)?]
        }
        (Some(arg), None) => bail!("unknown revision or path '{arg}'"),
        (Some(a), Some(b)) if is_rev(a) && is_rev(b) => {
            in_repo()?.diff_revisions(a, b, context)?
        }
        (Some(rev), Some(path)) if is_rev(rev) && is_file(path) => {
            vec![in_repo()?.diff_path(rev, &cwd.join(path), context)?]
        }
        (Some(a), Some(b)) if is_file(a) && is_file(b) => vec![diff_files(&cwd, a, b, context)?],
        (Some(a), Some(b)) => bail!("cannot compare '{a}' with '{b}'"),
        (None, Some(b)) => bail!("unexpected argument '{b}'"),
    };

    print!("{}", render(&diffs));
    Ok(())
}
