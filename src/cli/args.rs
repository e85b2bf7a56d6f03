//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::merge::strategy::MergeStrategy;

/// Kit - content-addressed version control with three-way merging
#[derive(Parser, Debug)]
#[command(name = "kit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if kit was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    ///
    /// Help and version requests come back as errors too; the caller decides
    /// the exit code.
    pub fn parse_args() -> Result<Self, clap::Error> {
        Self::try_parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty repository
    #[command(
        name = "init",
        long_about = "Create an empty kit repository in the current directory.\n\n\
            Sets up the .kit directory with an object store, reference \
            directories and a repository config. HEAD points at the initial \
            branch, which is created by the first commit."
    )]
    Init {
        /// Name of the initial branch
        #[arg(long, short = 'b')]
        branch: Option<String>,
    },

    /// Stage file contents for the next commit
    Add {
        /// Files to stage
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Record staged changes as a new commit
    #[command(
        name = "commit",
        long_about = "Record the tracked and staged files as a new commit.\n\n\
            When a merge is pending (after conflicts or --no-commit), the \
            commit concludes it and records the merged branch as a second parent."
    )]
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },

    /// List branches, or create one at HEAD
    Branch {
        /// Name of the branch to create
        name: Option<String>,
    },

    /// List tags, or create one at HEAD
    Tag {
        /// Name of the tag to create
        name: Option<String>,
    },

    /// Switch to a branch, or detach HEAD at a commit
    Checkout {
        /// Branch name, tag or commit id
        target: String,
    },

    /// Merge another branch into the current one
    #[command(
        name = "merge",
        long_about = "Merge another branch into the current branch.\n\n\
            If the current branch is an ancestor of the other one, the branch \
            is fast-forwarded. Otherwise a three-way merge against the merge \
            base runs and, if it succeeds, creates a commit with two parents.\n\n\
            Conflicts are not errors. They are reported, conflict markers are \
            written into the affected files and the merge is left pending until \
            the next commit.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Merge a feature branch
    kit merge feature

    # Prefer our side wherever both sides changed the same lines
    kit merge feature --strategy ours

    # Stage the result without committing
    kit merge feature --no-commit
    kit commit -m \"Merge feature\"

STRATEGIES:
    auto     merge non-overlapping edits, keep ours on true conflicts (default)
    ours     take our version of a conflicting file
    theirs   take their version of a conflicting file
    manual   stop on conflicts with markers for resolution"
    )]
    Merge {
        /// Branch to merge in
        branch: String,

        /// How to settle conflicting edits
        #[arg(long, short = 's')]
        strategy: Option<MergeStrategy>,

        /// Stage the merge result instead of committing it
        #[arg(long)]
        no_commit: bool,

        /// Merge commit message
        #[arg(short, long)]
        message: Option<String>,

        /// Let the similarity oracle settle conflicts in source files
        #[arg(long)]
        semantic: bool,
    },

    /// Show changes between revisions, files and the working tree
    #[command(
        name = "diff",
        after_help = "\
FORMS:
    kit diff                    HEAD against the working tree
    kit diff <rev>              a revision against the working tree
    kit diff <path>             a file at HEAD against the working file
    kit diff <rev> <rev>        two revisions
    kit diff <rev> <path>       a file at a revision against the working file
    kit diff <path> <path>      two files"
    )]
    Diff {
        /// Unchanged lines shown around each change
        #[arg(long, short = 'U')]
        context: Option<usize>,

        /// Revision or path
        left: Option<String>,

        /// Revision or path
        right: Option<String>,
    },

    /// Show first-parent commit history
    Log {
        /// Limit the number of commits
        #[arg(short = 'n', long = "max-count")]
        max_count: Option<usize>,
    },

    /// Check object integrity and reference targets
    Verify,

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
INSTALLATION:
    # Bash
    kit completion bash > ~/.local/share/bash-completion/completions/kit

    # Zsh
    kit completion zsh > ~/.zfunc/_kit

    # Fish
    kit completion fish > ~/.config/fish/completions/kit.fish

    # PowerShell
    kit completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
