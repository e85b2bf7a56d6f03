//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Kit has two configuration scopes:
//! - **Global**: User-level settings
//! - **Repo**: Repository-level overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$KIT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/kit/config.toml`
//! 3. `~/.kit/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use kitwork::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/path/to/repo"))).unwrap();
//!
//! println!("Author: {}", config.author());
//! println!("Context: {}", config.context_lines());
//! println!("Strategy: {}", config.merge_strategy());
//! ```

pub mod schema;

pub use schema::{DiffConfig, GlobalConfig, MergeConfig, RepoConfig, UserConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::paths::KitPaths;
use crate::merge::strategy::MergeStrategy;

/// Author used when no identity is configured.
pub const DEFAULT_AUTHOR_NAME: &str = "Kit User";
pub const DEFAULT_AUTHOR_EMAIL: &str = "kit@example.com";
/// Branch HEAD points at after `init` when nothing else is configured.
pub const DEFAULT_BRANCH: &str = "main";
/// Unchanged lines shown around each diff change by default.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence: repo config overrides global config,
/// which overrides built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if in a repo)
    pub repo: Option<RepoConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `work_dir` is provided, also loads `<work_dir>/.kit/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or fail
    /// validation. Missing config files are not an error.
    pub fn load(work_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let (global, global_path) = Self::load_global()?;

        let repo = match work_dir {
            Some(dir) => {
                let path = KitPaths::new(dir.to_path_buf()).repo_config_path();
                if path.exists() {
                    Some(Self::read_config::<RepoConfig>(&path)?)
                } else {
                    None
                }
            }
            None => None,
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        if let Some(path) = &global_path {
            tracing::debug!(path = %path.display(), "loaded global config");
        }

        Ok(Config {
            global,
            repo,
            global_path,
        })
    }

    /// Load global configuration from standard locations.
    fn load_global() -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        for path in Self::global_candidates() {
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }
        Ok((GlobalConfig::default(), None))
    }

    fn global_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Ok(path) = std::env::var("KIT_CONFIG") {
            candidates.push(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            candidates.push(PathBuf::from(xdg_home).join("kit/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".kit/config.toml"));
        }
        candidates
    }

    fn read_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical path for global config.
    ///
    /// Returns `~/.kit/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".kit/config.toml"))
    }

    /// Write global config atomically.
    pub fn write_global(config: &GlobalConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = Self::global_config_path()?;
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    /// Write repo config atomically to `.kit/config.toml`.
    pub fn write_repo(paths: &KitPaths, config: &RepoConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = paths.repo_config_path();
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    /// Write a config file atomically (temp file, then rename).
    fn write_config_atomic<T: serde::Serialize>(
        path: &Path,
        config: &T,
    ) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let write_err = |e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        };
        let mut file = fs::File::create(&temp_path).map_err(write_err)?;
        file.write_all(contents.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Pick a value from the repo section, else the global one.
    fn pick<T>(
        &self,
        repo: impl Fn(&RepoConfig) -> Option<T>,
        global: impl Fn(&GlobalConfig) -> Option<T>,
    ) -> Option<T> {
        self.repo
            .as_ref()
            .and_then(repo)
            .or_else(|| global(&self.global))
    }

    /// Commit author as `Name <email>`.
    ///
    /// Defaults to `Kit User <kit@example.com>`.
    pub fn author(&self) -> String {
        let name = self
            .pick(
                |r| r.user.as_ref().and_then(|u| u.name.clone()),
                |g| g.user.as_ref().and_then(|u| u.name.clone()),
            )
            .unwrap_or_else(|| DEFAULT_AUTHOR_NAME.to_string());
        let email = self
            .pick(
                |r| r.user.as_ref().and_then(|u| u.email.clone()),
                |g| g.user.as_ref().and_then(|u| u.email.clone()),
            )
            .unwrap_or_else(|| DEFAULT_AUTHOR_EMAIL.to_string());
        format!("{name} <{email}>")
    }

    /// Unchanged lines shown around diff changes. Defaults to 3.
    pub fn context_lines(&self) -> usize {
        self.pick(
            |r| r.diff.as_ref().and_then(|d| d.context_lines),
            |g| g.diff.as_ref().and_then(|d| d.context_lines),
        )
        .unwrap_or(DEFAULT_CONTEXT_LINES)
    }

    /// Default merge strategy. Defaults to `auto`.
    pub fn merge_strategy(&self) -> MergeStrategy {
        self.pick(
            |r| r.merge.as_ref().and_then(|m| m.strategy.clone()),
            |g| g.merge.as_ref().and_then(|m| m.strategy.clone()),
        )
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
    }

    /// Whether merges consult the similarity oracle. Defaults to `false`.
    pub fn semantic_merge(&self) -> bool {
        self.pick(
            |r| r.merge.as_ref().and_then(|m| m.semantic),
            |g| g.merge.as_ref().and_then(|m| m.semantic),
        )
        .unwrap_or(false)
    }

    /// Branch created by `init`. Defaults to `main`.
    pub fn default_branch(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.default_branch.as_deref())
            .unwrap_or(DEFAULT_BRANCH)
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }
}
