//! core::paths
//!
//! Centralized path routing for the `.kit` metadata directory.
//!
//! # Storage Layout
//!
//! All repository data lives under `<work_dir>/.kit/`:
//! - `objects/<2-hex>/<62-hex>` - content-addressed objects
//! - `refs/heads/<name>` - branch heads
//! - `refs/tags/<name>` - tags
//! - `HEAD` - `ref: refs/heads/<name>` or a raw commit id
//! - `MERGE_HEAD` - commit being merged while a merge is pending
//! - `index` - staged and tracked entries
//! - `config.toml` - repository configuration
//! - `lock` - exclusive lock file
//!
//! No code outside this module joins `.kit` paths by hand.
//!
//! # Example
//!
//! ```
//! use kitwork::core::paths::KitPaths;
//! use std::path::PathBuf;
//!
//! let paths = KitPaths::new(PathBuf::from("/repo"));
//! assert_eq!(paths.kit_dir(), PathBuf::from("/repo/.kit"));
//! assert_eq!(paths.objects_dir(), PathBuf::from("/repo/.kit/objects"));
//! ```

use std::path::{Path, PathBuf};

/// Name of the metadata directory at the root of a working tree.
pub const KIT_DIR: &str = ".kit";

/// Centralized path routing for kit storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitPaths {
    /// Root of the working tree (the directory containing `.kit`).
    pub work_dir: PathBuf,
}

impl KitPaths {
    /// Create paths for a working tree rooted at `work_dir`.
    pub fn new(work_dir: PathBuf) -> Self {
        Self { work_dir }
    }

    /// Walk up from `start` looking for a directory that contains `.kit`.
    ///
    /// # Example
    ///
    /// ```
    /// use kitwork::core::paths::KitPaths;
    ///
    /// let temp = tempfile::TempDir::new().unwrap();
    /// std::fs::create_dir_all(temp.path().join(".kit")).unwrap();
    /// std::fs::create_dir_all(temp.path().join("src/nested")).unwrap();
    ///
    /// let found = KitPaths::discover(&temp.path().join("src/nested")).unwrap();
    /// assert_eq!(found.work_dir, temp.path());
    /// ```
    pub fn discover(start: &Path) -> Option<Self> {
        start
            .ancestors()
            .find(|dir| dir.join(KIT_DIR).is_dir())
            .map(|dir| Self::new(dir.to_path_buf()))
    }

    /// The `.kit` metadata directory.
    pub fn kit_dir(&self) -> PathBuf {
        self.work_dir.join(KIT_DIR)
    }

    /// Root of the object database.
    pub fn objects_dir(&self) -> PathBuf {
        self.kit_dir().join("objects")
    }

    /// Root of the reference namespace. Ref names resolve relative to `.kit`,
    /// so `refs/heads/main` lives at `<kit_dir>/refs/heads/main`.
    pub fn refs_dir(&self) -> PathBuf {
        self.kit_dir().join("refs")
    }

    /// Directory holding branch heads.
    pub fn heads_dir(&self) -> PathBuf {
        self.refs_dir().join("heads")
    }

    /// Directory holding tags.
    pub fn tags_dir(&self) -> PathBuf {
        self.refs_dir().join("tags")
    }

    /// The persisted index of staged and tracked entries.
    pub fn index_path(&self) -> PathBuf {
        self.kit_dir().join("index")
    }

    /// The repository configuration file.
    pub fn repo_config_path(&self) -> PathBuf {
        self.kit_dir().join("config.toml")
    }

    /// The repository lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.kit_dir().join("lock")
    }

    /// Absolute location of a working-tree relative path.
    pub fn work_path(&self, relative: &str) -> PathBuf {
        self.work_dir.join(relative)
    }
}
