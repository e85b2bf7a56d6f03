//! merge::strategy
//!
//! Merge strategy selection and per-merge options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected strategy name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported merge strategy '{0}' (expected auto, ours, theirs or manual)")]
pub struct UnsupportedStrategy(pub String);

/// How conflicts left by the three-way file merge are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Merge non-overlapping edits; true conflicts keep our version.
    #[default]
    Auto,
    /// Take our side of every conflicting file.
    Ours,
    /// Take their side of every conflicting file.
    Theirs,
    /// Never auto-resolve; surface conflicts for the user.
    Manual,
}

impl MergeStrategy {
    pub const ALL: [MergeStrategy; 4] = [Self::Auto, Self::Ours, Self::Theirs, Self::Manual];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Ours => "ours",
            Self::Theirs => "theirs",
            Self::Manual => "manual",
        }
    }
}

impl FromStr for MergeStrategy {
    type Err = UnsupportedStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnsupportedStrategy(s.to_string()))
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for a single merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOptions {
    pub strategy: MergeStrategy,
    /// Stage the merged tree and record `MERGE_HEAD` instead of committing.
    pub no_commit: bool,
    /// Commit message; defaults to `Merge branch '<theirs>' into <ours>`.
    pub message: Option<String>,
    /// Consult the similarity oracle on would-be conflicts in source files.
    pub semantic: bool,
}

impl MergeOptions {
    pub fn with_strategy(strategy: MergeStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }
}
