//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens the repository from the [`Context`]
//! 2. Calls one [`crate::repo::Repository`] operation
//! 3. Formats and displays the result
//!
//! Handlers do NOT read or write `.kit` storage directly.

mod add;
mod branch;
mod checkout;
mod commit;
mod completion;
mod diff;
mod init;
mod log_cmd;
mod merge;
mod tag;
mod verify;

// Re-export command functions for testing and direct invocation
pub use add::add;
pub use branch::branch;
pub use checkout::checkout;
pub use commit::commit;
pub use completion::completion;
pub use diff::diff;
pub use init::init;
pub use log_cmd::log;
pub use merge::merge;
pub use tag::tag;
pub use verify::verify;

use crate::cli::args::Command;
use crate::cli::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init { branch } => init(ctx, branch.as_deref()),
        Command::Add { paths } => add(ctx, &paths),
        Command::Commit { message } => commit(ctx, &message),
        Command::Branch { name } => branch(ctx, name.as_deref()),
        Command::Tag { name } => tag(ctx, name.as_deref()),
        Command::Checkout { target } => checkout(ctx, &target),
        Command::Merge {
            branch,
            strategy,
            no_commit,
            message,
            semantic,
        } => merge(ctx, &branch, strategy, no_commit, message, semantic),
        Command::Diff {
            context,
            left,
            right,
        } => diff(ctx, context, left.as_deref(), right.as_deref()),
        Command::Log { max_count } => log(ctx, max_count),
        Command::Verify => verify(ctx),
        Command::Completion { shell } => completion(shell),
    }
}
