//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$KIT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/kit/config.toml`
//! 3. `~/.kit/config.toml` (canonical write location)
//!
//! # Repo Config
//!
//! Located at `.kit/config.toml` in the working tree root.
//!
//! # Validation
//!
//! Config values are validated after parsing (branch names must be valid,
//! strategies must be known, context sizes bounded).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;
use crate::merge::strategy::MergeStrategy;

/// Largest accepted `diff.context_lines`.
pub const MAX_CONTEXT_LINES: usize = 10_000;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// [user]
/// name = "Ada Lovelace"
/// email = "ada@example.com"
///
/// [diff]
/// context_lines = 3
///
/// [merge]
/// strategy = "auto"
/// semantic = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Commit author identity
    pub user: Option<UserConfig>,

    /// Diff rendering defaults
    pub diff: Option<DiffConfig>,

    /// Merge defaults
    pub merge: Option<MergeConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_sections(self.user.as_ref(), self.diff.as_ref(), self.merge.as_ref())
    }
}

/// Repository configuration.
///
/// Carries the same sections as [`GlobalConfig`], which it overrides, plus
/// repository-only settings.
///
/// # Example
///
/// ```toml
/// default_branch = "main"
///
/// [merge]
/// strategy = "manual"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Branch HEAD points at after `init`
    pub default_branch: Option<String>,

    pub user: Option<UserConfig>,

    pub diff: Option<DiffConfig>,

    pub merge: Option<MergeConfig>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(branch) = &self.default_branch {
            BranchName::new(branch).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid default branch name: {}", e))
            })?;
        }
        validate_sections(self.user.as_ref(), self.diff.as_ref(), self.merge.as_ref())
    }
}

fn validate_sections(
    user: Option<&UserConfig>,
    diff: Option<&DiffConfig>,
    merge: Option<&MergeConfig>,
) -> Result<(), ConfigError> {
    if let Some(user) = user {
        user.validate()?;
    }
    if let Some(diff) = diff {
        diff.validate()?;
    }
    if let Some(merge) = merge {
        merge.validate()?;
    }
    Ok(())
}

/// Author identity recorded on commits.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct UserConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [("user.name", &self.name), ("user.email", &self.email)] {
            if let Some(value) = value {
                if value.trim().is_empty() || value.contains(['\n', '<', '>']) {
                    return Err(ConfigError::InvalidValue(format!(
                        "{key} must be non-empty and cannot contain newlines or angle brackets"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Diff defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DiffConfig {
    /// Unchanged lines shown around each change
    pub context_lines: Option<usize>,
}

impl DiffConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(n) = self.context_lines {
            if n > MAX_CONTEXT_LINES {
                return Err(ConfigError::InvalidValue(format!(
                    "diff.context_lines must be at most {MAX_CONTEXT_LINES}, got {n}"
                )));
            }
        }
        Ok(())
    }
}

/// Merge defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    /// One of `auto`, `ours`, `theirs`, `manual`
    pub strategy: Option<String>,

    /// Consult the similarity oracle on would-be conflicts
    pub semantic: Option<bool>,
}

impl MergeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(strategy) = &self.strategy {
            strategy
                .parse::<MergeStrategy>()
                .map_err(|e| ConfigError::InvalidValue(format!("merge.strategy: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod global_config {
        use super::*;

        #[test]
        fn defaults() {
            let config = GlobalConfig::default();
            assert!(config.user.is_none());
            assert!(config.diff.is_none());
            assert!(config.merge.is_none());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn invalid_strategy() {
            let config = GlobalConfig {
                merge: Some(MergeConfig {
                    strategy: Some("octopus".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn context_lines_bounded() {
            let config = GlobalConfig {
                diff: Some(DiffConfig {
                    context_lines: Some(MAX_CONTEXT_LINES + 1),
                }),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn user_email_cannot_hold_brackets() {
            let config = GlobalConfig {
                user: Some(UserConfig {
                    name: Some("Ada".to_string()),
                    email: Some("<ada@example.com>".to_string()),
                }),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn roundtrip() {
            let config = GlobalConfig {
                user: Some(UserConfig {
                    name: Some("Ada".to_string()),
                    email: Some("ada@example.com".to_string()),
                }),
                diff: Some(DiffConfig {
                    context_lines: Some(5),
                }),
                merge: Some(MergeConfig {
                    strategy: Some("theirs".to_string()),
                    semantic: Some(true),
                }),
            };

            let toml = toml::to_string_pretty(&config).unwrap();
            let parsed: GlobalConfig = toml::from_str(&toml).unwrap();
            assert_eq!(config, parsed);
        }
    }

    mod repo_config {
        use super::*;

        #[test]
        fn valid_default_branch() {
            let config = RepoConfig {
                default_branch: Some("trunk".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_ok());
        }

        #[test]
        fn invalid_default_branch() {
            let config = RepoConfig {
                default_branch: Some("invalid..name".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn reject_unknown_fields() {
            let toml = r#"
                default_branch = "main"
                unknown_field = true
            "#;

            let result: Result<RepoConfig, _> = toml::from_str(toml);
            assert!(result.is_err());
        }
    }
}
