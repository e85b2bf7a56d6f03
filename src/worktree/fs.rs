//! worktree::fs
//!
//! Filesystem working tree with a JSON index at `.kit/index`.
//!
//! The index is rewritten atomically after every state change.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{RepositoryState, WorkTreeError, WorkingTree};
use crate::core::object::{EntryKind, Tree};
use crate::core::paths::KitPaths;
use crate::core::types::ObjectId;
use crate::merge::tree::MergeConflict;
use crate::store::objects::ObjectStore;

/// Working files under the repository root.
#[derive(Debug)]
pub struct FsWorkTree {
    paths: KitPaths,
    state: RepositoryState,
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> WorkTreeError + '_ {
    move |source| WorkTreeError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl FsWorkTree {
    /// Load the index, starting empty when there is none yet.
    pub fn open(paths: KitPaths) -> Result<Self, WorkTreeError> {
        let index = paths.index_path();
        let state = match fs::read(&index) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| WorkTreeError::CorruptIndex {
                path: index.clone(),
                message: e.to_string(),
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => RepositoryState::default(),
            Err(e) => return Err(io_err(&index)(e)),
        };
        Ok(Self { paths, state })
    }

    pub fn state(&self) -> &RepositoryState {
        &self.state
    }

    /// Persist the index.
    pub fn save(&self) -> Result<(), WorkTreeError> {
        let index = self.paths.index_path();
        let bytes = serde_json::to_vec_pretty(&self.state).map_err(|e| {
            WorkTreeError::CorruptIndex {
                path: index.clone(),
                message: e.to_string(),
            }
        })?;

        let temp = index.with_extension("tmp");
        let mut file = fs::File::create(&temp).map_err(io_err(&temp))?;
        file.write_all(&bytes)
            .and_then(|()| file.sync_all())
            .map_err(io_err(&temp))?;
        fs::rename(&temp, &index).map_err(io_err(&index))
    }

    fn file_path(&self, path: &str) -> PathBuf {
        self.paths.work_path(path)
    }

    fn write_file(&self, path: &str, bytes: &[u8]) -> Result<(), WorkTreeError> {
        let target = self.file_path(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        fs::write(&target, bytes).map_err(io_err(&target))
    }

    fn write_tree(&self, store: &ObjectStore, tree: &Tree) -> Result<(), WorkTreeError> {
        for (path, entry) in tree.iter() {
            if entry.kind == EntryKind::Blob {
                let bytes = store.get(&entry.id)?;
                self.write_file(path, &bytes)?;
            }
        }
        Ok(())
    }
}

impl WorkingTree for FsWorkTree {
    fn staged_entries(&self) -> BTreeMap<String, ObjectId> {
        self.state.stage.clone()
    }

    fn tracked_entries(&self) -> BTreeMap<String, ObjectId> {
        self.state.tracked.clone()
    }

    fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>, WorkTreeError> {
        let target = self.file_path(path);
        match fs::read(&target) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(&target)(e)),
        }
    }

    fn unmerged_paths(&self) -> BTreeSet<String> {
        self.state.unmerged.clone()
    }

    fn stage(&mut self, path: &str, id: ObjectId) -> Result<(), WorkTreeError> {
        self.state.stage(path, id);
        self.save()
    }

    fn record_commit(&mut self, tree: &Tree) -> Result<(), WorkTreeError> {
        self.state.commit(tree);
        self.save()
    }

    fn materialize(&mut self, store: &ObjectStore, tree: &Tree) -> Result<(), WorkTreeError> {
        for path in self.state.tracked.keys() {
            if tree.get(path).is_none() {
                let target = self.file_path(path);
                match fs::remove_file(&target) {
                    Ok(()) => tracing::debug!(path, "removed file"),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(io_err(&target)(e)),
                }
            }
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
            let target = self.file_path(&path);
            match fs::remove_file(&target) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_err(&target)(e)),
            }
            self.state.tracked.remove(&path);
            self.state.stage.remove(&path);
        }
        self.write_tree(store, tree)?;
        for (path, id) in tree.to_id_map() {
            if self.state.tracked.get(&path) != Some(&id) {
                self.state.stage.insert(path, id);
            }
        }
        self.save()
    }

    fn write_conflicts(&mut self, conflicts: &[MergeConflict]) -> Result<(), WorkTreeError> {
        for conflict in conflicts {
            self.write_file(&conflict.path, conflict.materialized().as_bytes())?;
        }
        self.state.mark_unmerged(conflicts);
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, KitPaths, ObjectStore) {
        let temp = TempDir::new().unwrap();
        let paths = KitPaths::new(temp.path().to_path_buf());
        fs::create_dir_all(paths.kit_dir()).unwrap();
        let store = ObjectStore::new(paths.objects_dir());
        store.init().unwrap();
        (temp, paths, store)
    }

    #[test]
    fn missing_index_is_empty() {
        let (_temp, paths, _store) = setup();
        let wt = FsWorkTree::open(paths).unwrap();
        assert_eq!(wt.state(), &RepositoryState::default());
    }

    #[test]
    fn stage_persists_across_open() {
        let (_temp, paths, _store) = setup();
        let id = ObjectId::hash_bytes(b"x");
        let mut wt = FsWorkTree::open(paths.clone()).unwrap();
        wt.stage("a.txt", id.clone()).unwrap();

        let reopened = FsWorkTree::open(paths).unwrap();
        assert_eq!(reopened.staged_entries().get("a.txt"), Some(&id));
        assert!(reopened.has_staged());
    }

    #[test]
    fn corrupt_index_is_reported() {
        let (_temp, paths, _store) = setup();
        fs::write(paths.index_path(), "{ nope").unwrap();
        assert!(matches!(
            FsWorkTree::open(paths),
            Err(WorkTreeError::CorruptIndex { .. })
        ));
    }

    #[test]
    fn materialize_writes_and_removes_files() {
        let (temp, paths, store) = setup();
        let mut wt = FsWorkTree::open(paths).unwrap();

        let first = Tree::from_blobs([
            ("keep.txt".to_string(), store.put(b"keep\n").unwrap()),
            ("dir/old.txt".to_string(), store.put(b"old\n").unwrap()),
        ])
        .unwrap();
        wt.materialize(&store, &first).unwrap();
        assert_eq!(
            fs::read_to_string(temp.path().join("dir/old.txt")).unwrap(),
            "old\n"
        );

        let second =
            Tree::from_blobs([("keep.txt".to_string(), store.put(b"new\n").unwrap())]).unwrap();
        wt.materialize(&store, &second).unwrap();

        assert!(!temp.path().join("dir/old.txt").exists());
        assert_eq!(wt.read_file("keep.txt").unwrap().unwrap(), b"new\n");
        assert_eq!(wt.tracked_entries(), second.to_id_map());
        assert!(!wt.has_staged());
    }

    #[test]
    fn conflicts_stay_unmerged_until_staged() {
        let (temp, paths, store) = setup();
        let mut wt = FsWorkTree::open(paths.clone()).unwrap();
        let conflict = MergeConflict {
            path: "f".into(),
            base: "x\n".into(),
            ours: "y\n".into(),
            theirs: "z\n".into(),
            resolution: None,
        };
        wt.write_conflicts(&[conflict]).unwrap();
        assert!(fs::read_to_string(temp.path().join("f"))
            .unwrap()
            .starts_with("<<<<<<< OURS"));

        let mut reopened = FsWorkTree::open(paths).unwrap();
        assert_eq!(reopened.unmerged_paths(), BTreeSet::from(["f".to_string()]));

        reopened.stage("f", store.put(b"fixed\n").unwrap()).unwrap();
        assert!(reopened.unmerged_paths().is_empty());
    }

    #[test]
    fn stage_tree_stages_only_differences() {
        let (_temp, paths, store) = setup();
        let mut wt = FsWorkTree::open(paths).unwrap();
        let same = store.put(b"same\n").unwrap();
        let base = Tree::from_blobs([("a".to_string(), same.clone())]).unwrap();
        wt.materialize(&store, &base).unwrap();

        let changed = store.put(b"changed\n").unwrap();
        let next =
            Tree::from_blobs([("a".to_string(), same), ("b".to_string(), changed.clone())]).unwrap();
        wt.stage_tree(&store, &next).unwrap();

        assert_eq!(
            wt.staged_entries(),
            BTreeMap::from([("b".to_string(), changed)])
        );
        assert_eq!(wt.state().snapshot(), next.to_id_map());
    }
}
