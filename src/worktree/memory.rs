//! worktree::memory
//!
//! In-memory working tree for deterministic testing.
//!
//! # Example
//!
//! ```
//! use kitwork::worktree::{MemoryWorkTree, WorkingTree};
//! use kitwork::core::types::ObjectId;
//!
//! let mut wt = MemoryWorkTree::new();
//! wt.set_file("notes.txt", "hello\n");
//! wt.stage("notes.txt", ObjectId::hash_bytes(b"hello\n")).unwrap();
//!
//! assert!(wt.has_staged());
//! assert_eq!(wt.file("notes.txt").as_deref(), Some("hello\n"));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use super::{RepositoryState, WorkTreeError, WorkingTree};
use crate::core::object::{EntryKind, Tree};
use crate::core::types::ObjectId;
use crate::merge::tree::MergeConflict;
use crate::store::objects::ObjectStore;

/// Working tree held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkTree {
    files: BTreeMap<String, Vec<u8>>,
    state: RepositoryState,
}

impl MemoryWorkTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a working file without staging it.
    pub fn set_file(&mut self, path: &str, content: impl Into<Vec<u8>>) {
        self.files.insert(path.to_string(), content.into());
    }

    /// Working file content as text.
    pub fn file(&self, path: &str) -> Option<String> {
        self.files
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn paths(&self) -> impl Iterator<Item = &String> {
        self.files.keys()
    }

    pub fn state(&self) -> &RepositoryState {
        &self.state
    }

    fn write_tree(&mut self, store: &ObjectStore, tree: &Tree) -> Result<(), WorkTreeError> {
        for (path, entry) in tree.iter() {
            if entry.kind == EntryKind::Blob {
                let bytes = store.get(&entry.id)?;
                self.files.insert(path.clone(), bytes);
            }
        }
        Ok(())
    }
}

impl WorkingTree for MemoryWorkTree {
    fn staged_entries(&self) -> BTreeMap<String, ObjectId> {
        self.state.stage.clone()
    }

    fn tracked_entries(&self) -> BTreeMap<String, ObjectId> {
        self.state.tracked.clone()
    }

    fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>, WorkTreeError> {
        Ok(self.files.get(path).cloned())
    }

    fn unmerged_paths(&self) -> BTreeSet<String> {
        self.state.unmerged.clone()
    }

    fn stage(&mut self, path: &str, id: ObjectId) -> Result<(), WorkTreeError> {
        self.state.stage(path, id);
        Ok(())
    }

    fn record_commit(&mut self, tree: &Tree) -> Result<(), WorkTreeError> {
        self.state.commit(tree);
        Ok(())
    }

    fn materialize(&mut self, store: &ObjectStore, tree: &Tree) -> Result<(), WorkTreeError> {
        let stale: Vec<String> = self
            .state
            .tracked
            .keys()
            .filter(|p| tree.get(p).is_none())
            .cloned()
            .collect();
        for path in stale {
            self.files.remove(&path);
        }
        self.write_tree(store, tree)?;
        self.record_commit(tree)
    }

    fn stage_tree(&mut self, store: &ObjectStore, tree: &Tree) -> Result<(), WorkTreeError> {
        let stale: Vec<String> = self
            .state
            .tracked
            .keys()
            .filter(|p| tree.get(p).is_none())
            .cloned()
            .collect();
        for path in stale {
            self.files.remove(&path);
            self.state.tracked.remove(&path);
            self.state.stage.remove(&path);
        }
        self.write_tree(store, tree)?;
        for (path, id) in tree.to_id_map() {
            if self.state.tracked.get(&path) != Some(&id) {
                self.state.stage.insert(path, id);
            }
        }
        Ok(())
    }

    fn write_conflicts(&mut self, conflicts: &[MergeConflict]) -> Result<(), WorkTreeError> {
        for conflict in conflicts {
            self.files
                .insert(conflict.path.clone(), conflict.materialized().into_bytes());
        }
        self.state.mark_unmerged(conflicts);
        Ok(())
    }
}
