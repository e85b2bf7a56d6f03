//! diff::tree
//!
//! Two-way comparison of tree snapshots.
//!
//! Every path in either tree is classified exactly once as added, removed,
//! modified (entry ids differ) or unchanged. [`content_diffs`] turns the
//! changed blob paths into per-file line diffs.

use std::collections::BTreeSet;

use crate::core::object::{EntryKind, Tree, TreeEntry};
use crate::diff::line::{diff_lines, Hunk};
use crate::store::objects::{ObjectStore, StoreError};

/// Classification of one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
    Unchanged,
}

/// A path and how it differs between two trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeChange {
    pub path: String,
    pub kind: ChangeKind,
    pub old: Option<TreeEntry>,
    pub new: Option<TreeEntry>,
}

/// Classify every path of `old` and `new`, in path order.
///
/// # Example
///
/// ```
/// use kitwork::core::object::Tree;
/// use kitwork::core::types::ObjectId;
/// use kitwork::diff::tree::{diff_trees, ChangeKind};
///
/// let v1 = ObjectId::hash_bytes(b"1");
/// let v2 = ObjectId::hash_bytes(b"2");
/// let old = Tree::from_blobs([("a".to_string(), v1.clone()), ("b".to_string(), v1.clone())]).unwrap();
/// let new = Tree::from_blobs([("a".to_string(), v2), ("c".to_string(), v1)]).unwrap();
///
/// let kinds: Vec<_> = diff_trees(&old, &new).into_iter().map(|c| c.kind).collect();
/// assert_eq!(kinds, vec![ChangeKind::Modified, ChangeKind::Removed, ChangeKind::Added]);
/// ```
pub fn diff_trees(old: &Tree, new: &Tree) -> Vec<TreeChange> {
    let paths: BTreeSet<&String> = old.paths().chain(new.paths()).collect();

    paths
        .into_iter()
        .map(|path| {
            let before = old.get(path);
            let after = new.get(path);
            let kind = match (before, after) {
                (None, Some(_)) => ChangeKind::Added,
                (Some(_), None) => ChangeKind::Removed,
                (Some(a), Some(b)) if a.id != b.id => ChangeKind::Modified,
                _ => ChangeKind::Unchanged,
            };
            TreeChange {
                path: path.clone(),
                kind,
                old: before.cloned(),
                new: after.cloned(),
            }
        })
        .collect()
}

/// Line diff of one file. A missing side renders as `/dev/null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub old_path: Option<String>,
    pub new_path: Option<String>,
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// Diff two contents. Invalid UTF-8 is replaced lossily.
    pub fn between(
        old_path: Option<&str>,
        new_path: Option<&str>,
        old: &[u8],
        new: &[u8],
        context: usize,
    ) -> Self {
        let hunks = diff_lines(
            &String::from_utf8_lossy(old),
            &String::from_utf8_lossy(new),
            context,
        );
        Self {
            old_path: old_path.map(str::to_string),
            new_path: new_path.map(str::to_string),
            hunks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }
}

fn blob_bytes(store: &ObjectStore, entry: Option<&TreeEntry>) -> Result<Vec<u8>, StoreError> {
    match entry {
        Some(e) if e.kind == EntryKind::Blob => store.get(&e.id),
        _ => Ok(Vec::new()),
    }
}

/// Line diffs for every changed blob between two trees.
pub fn content_diffs(
    store: &ObjectStore,
    old: &Tree,
    new: &Tree,
    context: usize,
) -> Result<Vec<FileDiff>, StoreError> {
    let mut diffs = Vec::new();
    for change in diff_trees(old, new) {
        if change.kind == ChangeKind::Unchanged {
            continue;
        }
        let is_blob = |e: &Option<TreeEntry>| e.as_ref().is_some_and(|e| e.kind == EntryKind::Blob);
        if !is_blob(&change.old) && !is_blob(&change.new) {
            continue;
        }

        let before = blob_bytes(store, change.old.as_ref())?;
        let after = blob_bytes(store, change.new.as_ref())?;
        let path = change.path.as_str();
        let diff = FileDiff::between(
            change.old.as_ref().map(|_| path),
            change.new.as_ref().map(|_| path),
            &before,
            &after,
            context,
        );
        diffs.push(diff);
    }
    Ok(diffs)
}
