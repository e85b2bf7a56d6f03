//! store::refs
//!
//! Reference store: named mutable pointers to commits.
//!
//! # Format
//!
//! Every reference is one file under `.kit/`, named after the reference:
//! - Direct: `<64-hex id>\n`
//! - Symbolic: `ref: <refname>\n`
//!
//! `HEAD` is symbolic while a branch is checked out and direct when detached.
//! `MERGE_HEAD` exists only while a merge is waiting to be committed.
//!
//! # Invariants
//!
//! - Updates are atomic: content is written to a temporary sibling and
//!   renamed into place
//! - Resolution follows symbolic references with a visited set, so a cycle
//!   is reported as [`RefError::CorruptReference`] instead of looping
//! - File contents are trimmed when read

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::paths::KitPaths;
use crate::core::types::{BranchName, ObjectId, RefName};

/// Prefix marking a symbolic reference.
const SYMREF_PREFIX: &str = "ref: ";

/// Errors from reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The reference does not exist.
    #[error("reference not found: {name}")]
    NotFound { name: String },

    /// The reference exists but cannot be resolved to a commit.
    #[error("corrupt reference {name}: {reason}")]
    CorruptReference { name: String, reason: String },

    /// Filesystem failure.
    #[error("reference i/o error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RefError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What a reference file points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    /// A commit id.
    Direct(ObjectId),
    /// Another reference.
    Symbolic(RefName),
}

impl RefTarget {
    fn parse(name: &RefName, contents: &str) -> Result<Self, RefError> {
        let trimmed = contents.trim();
        let corrupt = |reason: String| RefError::CorruptReference {
            name: name.to_string(),
            reason,
        };
        match trimmed.strip_prefix(SYMREF_PREFIX) {
            Some(target) => RefName::new(target.trim())
                .map(Self::Symbolic)
                .map_err(|e| corrupt(e.to_string())),
            None => ObjectId::new(trimmed)
                .map(Self::Direct)
                .map_err(|e| corrupt(e.to_string())),
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Direct(id) => format!("{id}\n"),
            Self::Symbolic(name) => format!("{SYMREF_PREFIX}{name}\n"),
        }
    }
}

/// Filesystem-backed reference store rooted at `.kit/`.
#[derive(Debug, Clone)]
pub struct RefStore {
    paths: KitPaths,
}

impl RefStore {
    pub fn new(paths: KitPaths) -> Self {
        Self { paths }
    }

    /// Create `refs/heads` and `refs/tags`.
    pub fn init(&self) -> Result<(), RefError> {
        for dir in [self.paths.heads_dir(), self.paths.tags_dir()] {
            fs::create_dir_all(&dir).map_err(|e| RefError::io(&dir, e))?;
        }
        Ok(())
    }

    fn ref_path(&self, name: &RefName) -> PathBuf {
        self.paths.kit_dir().join(name.as_str())
    }

    /// Check whether a reference file exists.
    pub fn exists(&self, name: &RefName) -> bool {
        self.ref_path(name).is_file()
    }

    /// Read one level of a reference. `Ok(None)` if it does not exist.
    pub fn read(&self, name: &RefName) -> Result<Option<RefTarget>, RefError> {
        let path = self.ref_path(name);
        match fs::read_to_string(&path) {
            Ok(contents) => RefTarget::parse(name, &contents).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RefError::io(&path, e)),
        }
    }

    /// Follow symbolic references from `name`.
    ///
    /// Returns the commit id, or `None` if the chain ends at a reference that
    /// does not exist yet (an unborn branch).
    fn walk(&self, name: &RefName) -> Result<(Option<ObjectId>, RefName), RefError> {
        let mut visited = HashSet::new();
        let mut current = name.clone();

        loop {
            if !visited.insert(current.clone()) {
                return Err(RefError::CorruptReference {
                    name: name.to_string(),
                    reason: format!("symbolic reference cycle through {current}"),
                });
            }
            match self.read(&current)? {
                None => return Ok((None, current)),
                Some(RefTarget::Direct(id)) => return Ok((Some(id), current)),
                Some(RefTarget::Symbolic(next)) => current = next,
            }
        }
    }

    /// Resolve a reference to a commit id.
    ///
    /// # Errors
    ///
    /// - [`RefError::NotFound`] if `name` itself does not exist
    /// - [`RefError::CorruptReference`] on a cycle or a dangling symbolic target
    pub fn resolve(&self, name: &RefName) -> Result<ObjectId, RefError> {
        match self.walk(name)? {
            (Some(id), _) => Ok(id),
            (None, last) if &last == name => Err(RefError::NotFound {
                name: name.to_string(),
            }),
            (None, last) => Err(RefError::CorruptReference {
                name: name.to_string(),
                reason: format!("dangling symbolic target {last}"),
            }),
        }
    }

    /// Resolve a reference, treating a missing target as `None`.
    ///
    /// Used for `HEAD` before the first commit, where the branch it points at
    /// has not been created yet.
    pub fn try_resolve(&self, name: &RefName) -> Result<Option<ObjectId>, RefError> {
        Ok(self.walk(name)?.0)
    }

    /// Point `name` directly at `id`, replacing any previous target.
    pub fn update(&self, name: &RefName, id: &ObjectId) -> Result<(), RefError> {
        self.write(name, &RefTarget::Direct(id.clone()))?;
        tracing::debug!(reference = %name, id = %id.short(12), "updated reference");
        Ok(())
    }

    /// Make `name` a symbolic reference to `target`.
    pub fn update_symbolic(&self, name: &RefName, target: &RefName) -> Result<(), RefError> {
        self.write(name, &RefTarget::Symbolic(target.clone()))?;
        tracing::debug!(reference = %name, target = %target, "updated symbolic reference");
        Ok(())
    }

    fn write(&self, name: &RefName, target: &RefTarget) -> Result<(), RefError> {
        let path = self.ref_path(name);
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.paths.kit_dir());
        fs::create_dir_all(&dir).map_err(|e| RefError::io(&dir, e))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp = dir.join(format!(".{file_name}.tmp-{}", std::process::id()));
        let mut file = fs::File::create(&temp).map_err(|e| RefError::io(&temp, e))?;
        file.write_all(target.render().as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| RefError::io(&temp, e))?;
        fs::rename(&temp, &path).map_err(|e| RefError::io(&path, e))
    }

    /// Delete a reference. Deleting a missing reference is not an error.
    pub fn delete(&self, name: &RefName) -> Result<(), RefError> {
        let path = self.ref_path(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RefError::io(&path, e)),
        }
    }

    /// Read `HEAD` without following it.
    pub fn head(&self) -> Result<RefTarget, RefError> {
        let head = RefName::head();
        self.read(&head)?.ok_or(RefError::NotFound {
            name: head.to_string(),
        })
    }

    /// The branch `HEAD` points at, or `None` when detached.
    pub fn current_branch(&self) -> Result<Option<BranchName>, RefError> {
        Ok(match self.head()? {
            RefTarget::Symbolic(target) => target.branch_name(),
            RefTarget::Direct(_) => None,
        })
    }

    /// The reference a new commit should move: the checked-out branch, or
    /// `HEAD` itself when detached.
    pub fn head_update_target(&self) -> Result<RefName, RefError> {
        Ok(match self.head()? {
            RefTarget::Symbolic(target) => target,
            RefTarget::Direct(_) => RefName::head(),
        })
    }

    /// Commit pending as the second parent of the next commit, if any.
    pub fn merge_head(&self) -> Result<Option<ObjectId>, RefError> {
        self.try_resolve(&RefName::merge_head())
    }

    pub fn set_merge_head(&self, id: &ObjectId) -> Result<(), RefError> {
        self.update(&RefName::merge_head(), id)
    }

    pub fn clear_merge_head(&self) -> Result<(), RefError> {
        self.delete(&RefName::merge_head())
    }

    /// All branches with their tips, sorted by name.
    pub fn branches(&self) -> Result<Vec<(BranchName, ObjectId)>, RefError> {
        self.list(&self.paths.heads_dir(), RefName::for_branch)
    }

    /// All tags with their targets, sorted by name.
    pub fn tags(&self) -> Result<Vec<(BranchName, ObjectId)>, RefError> {
        self.list(&self.paths.tags_dir(), RefName::for_tag)
    }

    fn list(
        &self,
        root: &Path,
        to_ref: fn(&BranchName) -> RefName,
    ) -> Result<Vec<(BranchName, ObjectId)>, RefError> {
        let mut found = Vec::new();
        if !root.is_dir() {
            return Ok(found);
        }

        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            let entries = fs::read_dir(&dir).map_err(|e| RefError::io(&dir, e))?;
            for entry in entries {
                let path = entry.map_err(|e| RefError::io(&dir, e))?.path();
                if path.is_dir() {
                    stack.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(root) else {
                    continue;
                };
                let name = relative.to_string_lossy().replace('\\', "/");
                match BranchName::new(name.as_str()) {
                    Ok(branch) => {
                        let id = self.resolve(&to_ref(&branch))?;
                        found.push((branch, id));
                    }
                    Err(_) if name.split('/').any(|c| c.starts_with('.')) => {}
                    Err(e) => tracing::warn!(file = %path.display(), "skipping reference: {e}"),
                }
            }
        }

        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found)
    }
}
