//! worktree
//!
//! Working tree and index collaborator.
//!
//! # Architecture
//!
//! The merge engine and the repository never touch working files directly.
//! They talk to a [`WorkingTree`], which owns two maps:
//!
//! - **stage**: paths added since the last commit, path -> blob id
//! - **tracked**: the snapshot of the last commit or checkout, path -> blob id
//!
//! A halted merge also leaves an **unmerged** set: paths holding conflict
//! markers. Staging a path clears it; a commit is refused until the set is
//! empty.
//!
//! All of it lives in an explicit [`RepositoryState`] value owned by the
//! implementation, never in process-wide state.
//!
//! # Implementations
//!
//! - [`fs::FsWorkTree`] - real files, state persisted as JSON in `.kit/index`
//! - [`memory::MemoryWorkTree`] - in-memory files for deterministic tests

pub mod fs;
pub mod memory;

pub use fs::FsWorkTree;
pub use memory::MemoryWorkTree;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::object::Tree;
use crate::core::types::ObjectId;
use crate::merge::tree::MergeConflict;
use crate::store::objects::{ObjectStore, StoreError};

/// Errors from working tree operations.
#[derive(Debug, Error)]
pub enum WorkTreeError {
    /// Filesystem failure.
    #[error("working tree i/o error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted index cannot be decoded.
    #[error("corrupt index '{path}': {message}")]
    CorruptIndex { path: PathBuf, message: String },

    /// A blob needed to write a file is missing or unreadable.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Staged, tracked and unmerged entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryState {
    pub stage: BTreeMap<String, ObjectId>,
    pub tracked: BTreeMap<String, ObjectId>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub unmerged: BTreeSet<String>,
}

impl RepositoryState {
    /// Stage `path`, which also settles it if it was unmerged.
    pub fn stage(&mut self, path: &str, id: ObjectId) {
        self.unmerged.remove(path);
        self.stage.insert(path.to_string(), id);
    }

    /// Adopt `tree` as the committed snapshot.
    pub fn commit(&mut self, tree: &Tree) {
        self.tracked = tree.to_id_map();
        self.stage.clear();
        self.unmerged.clear();
    }

    /// Mark the unresolved `conflicts` as unmerged.
    pub fn mark_unmerged(&mut self, conflicts: &[MergeConflict]) {
        self.unmerged.extend(
            conflicts
                .iter()
                .filter(|c| !c.is_resolved())
                .map(|c| c.path.clone()),
        );
    }

    /// Snapshot the next commit would record: tracked, overridden by staged.
    pub fn snapshot(&self) -> BTreeMap<String, ObjectId> {
        let mut entries = self.tracked.clone();
        entries.extend(self.stage.iter().map(|(p, id)| (p.clone(), id.clone())));
        entries
    }
}

/// The working files plus the index, as seen by the core.
pub trait WorkingTree {
    /// Paths staged since the last commit.
    fn staged_entries(&self) -> BTreeMap<String, ObjectId>;

    /// Paths recorded by the last commit or checkout.
    fn tracked_entries(&self) -> BTreeMap<String, ObjectId>;

    /// Current bytes of a working file, `None` if it does not exist.
    fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>, WorkTreeError>;

    /// Paths left with conflict markers by a halted merge and not staged since.
    fn unmerged_paths(&self) -> BTreeSet<String>;

    /// Record `id` as the staged content of `path`.
    fn stage(&mut self, path: &str, id: ObjectId) -> Result<(), WorkTreeError>;

    /// Mark `tree` as committed: it becomes the tracked set, the stage and
    /// the unmerged set are cleared. Working files are left alone.
    fn record_commit(&mut self, tree: &Tree) -> Result<(), WorkTreeError>;

    /// Make the working files match `tree`: write every entry, remove
    /// tracked files absent from it, track it and clear the stage.
    fn materialize(&mut self, store: &ObjectStore, tree: &Tree) -> Result<(), WorkTreeError>;

    /// Write every entry of `tree` and stage the ones that differ from the
    /// tracked set. Tracked paths missing from `tree` are removed, so the
    /// next commit records exactly `tree`.
    fn stage_tree(&mut self, store: &ObjectStore, tree: &Tree) -> Result<(), WorkTreeError>;

    /// Overwrite the files of `conflicts` with their materialized content and
    /// mark the unresolved ones as unmerged.
    fn write_conflicts(&mut self, conflicts: &[MergeConflict]) -> Result<(), WorkTreeError>;

    /// Whether anything is staged.
    fn has_staged(&self) -> bool {
        !self.staged_entries().is_empty()
    }
}
