//! core::object
//!
//! The immutable object model: blobs, trees and commits.
//!
//! # Canonical Encoding
//!
//! Every object has exactly one byte form, and its id is the SHA-256 of
//! those bytes:
//!
//! - Blob: the raw file bytes.
//! - Tree: compact JSON of the path-sorted entry map.
//! - Commit: compact JSON with a fixed field order; absent parents are omitted.
//!
//! Tree entries live in a `BTreeMap`, so serialization always walks paths
//! in sorted order. Two trees with the same path -> entry mapping hash
//! identically no matter how they were built.
//!
//! # Example
//!
//! ```
//! use kitwork::core::object::{Tree, TreeEntry};
//! use kitwork::core::types::ObjectId;
//!
//! let a = ObjectId::hash_bytes(b"a");
//! let b = ObjectId::hash_bytes(b"b");
//!
//! let mut first = Tree::new();
//! first.insert("src/a.rs", TreeEntry::blob(a.clone())).unwrap();
//! first.insert("README", TreeEntry::blob(b.clone())).unwrap();
//!
//! let mut second = Tree::new();
//! second.insert("README", TreeEntry::blob(b)).unwrap();
//! second.insert("src/a.rs", TreeEntry::blob(a)).unwrap();
//!
//! assert_eq!(first.id(), second.id());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{ObjectId, UtcTimestamp};

/// Errors from object construction and decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ObjectError {
    /// The bytes are not a valid canonical encoding.
    #[error("corrupt {kind} object: {message}")]
    Corrupt {
        /// Which kind of object was being decoded
        kind: &'static str,
        /// What went wrong
        message: String,
    },

    /// A tree path is not a clean relative path.
    #[error("invalid tree path '{0}'")]
    InvalidPath(String),
}

/// File mode of a regular file entry.
pub const MODE_FILE: &str = "100644";
/// File mode of a directory entry.
pub const MODE_DIR: &str = "040000";

/// What a tree entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
}

/// One entry of a tree: mode, kind and target object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreeEntry {
    pub mode: String,
    pub kind: EntryKind,
    pub id: ObjectId,
}

impl TreeEntry {
    /// A regular-file entry pointing at a blob.
    pub fn blob(id: ObjectId) -> Self {
        Self {
            mode: MODE_FILE.to_string(),
            kind: EntryKind::Blob,
            id,
        }
    }

    /// A directory entry pointing at a subtree.
    pub fn tree(id: ObjectId) -> Self {
        Self {
            mode: MODE_DIR.to_string(),
            kind: EntryKind::Tree,
            id,
        }
    }
}

/// A snapshot mapping relative paths to entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tree {
    entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree of blob entries from a path -> blob id map.
    pub fn from_blobs<I>(blobs: I) -> Result<Self, ObjectError>
    where
        I: IntoIterator<Item = (String, ObjectId)>,
    {
        let mut tree = Self::new();
        for (path, id) in blobs {
            tree.insert(path, TreeEntry::blob(id))?;
        }
        Ok(tree)
    }

    /// Insert or replace the entry at `path`.
    ///
    /// Paths are `/`-separated and relative: no leading or trailing `/`,
    /// no empty, `.` or `..` components, no newlines or NULs.
    pub fn insert(&mut self, path: impl Into<String>, entry: TreeEntry) -> Result<(), ObjectError> {
        let path = path.into();
        validate_path(&path)?;
        self.entries.insert(path, entry);
        Ok(())
    }

    /// Insert an entry whose path was read from another tree, and so has
    /// already been validated.
    pub(crate) fn insert_from_tree(&mut self, path: &str, entry: TreeEntry) {
        self.entries.insert(path.to_string(), entry);
    }

    /// Remove the entry at `path`, returning it if present.
    pub fn remove(&mut self, path: &str) -> Option<TreeEntry> {
        self.entries.remove(path)
    }

    /// Look up the entry at `path`.
    pub fn get(&self, path: &str) -> Option<&TreeEntry> {
        self.entries.get(path)
    }

    /// Iterate entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &TreeEntry)> {
        self.entries.iter()
    }

    /// Iterate paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Path -> object id view of the tree.
    pub fn to_id_map(&self) -> BTreeMap<String, ObjectId> {
        self.entries
            .iter()
            .map(|(path, entry)| (path.clone(), entry.id.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical byte form.
    pub fn encode(&self) -> Vec<u8> {
        // A BTreeMap of plain strings cannot fail to serialize.
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Decode a canonical tree.
    pub fn decode(bytes: &[u8]) -> Result<Self, ObjectError> {
        let tree: Self = serde_json::from_slice(bytes).map_err(|e| ObjectError::Corrupt {
            kind: "tree",
            message: e.to_string(),
        })?;
        for path in tree.entries.keys() {
            validate_path(path).map_err(|e| ObjectError::Corrupt {
                kind: "tree",
                message: e.to_string(),
            })?;
        }
        Ok(tree)
    }

    /// Content address of this tree.
    pub fn id(&self) -> ObjectId {
        ObjectId::hash_bytes(&self.encode())
    }
}

fn validate_path(path: &str) -> Result<(), ObjectError> {
    let bad = path.is_empty()
        || path.contains(&['\n', '\0', '\\'][..])
        || path
            .split('/')
            .any(|c| c.is_empty() || c == "." || c == "..");
    if bad {
        return Err(ObjectError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// An immutable commit node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Commit {
    pub tree: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent2: Option<ObjectId>,
    pub author: String,
    pub message: String,
    pub timestamp: UtcTimestamp,
}

impl Commit {
    /// Parents in traversal order: first parent, then the merged-in parent.
    pub fn parents(&self) -> impl Iterator<Item = &ObjectId> {
        self.parent.iter().chain(self.parent2.iter())
    }

    /// Check if this commit records a merge.
    pub fn is_merge(&self) -> bool {
        self.parent2.is_some()
    }

    /// Canonical byte form.
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Decode a canonical commit.
    pub fn decode(bytes: &[u8]) -> Result<Self, ObjectError> {
        let commit: Self = serde_json::from_slice(bytes).map_err(|e| ObjectError::Corrupt {
            kind: "commit",
            message: e.to_string(),
        })?;
        if commit.parent.is_none() && commit.parent2.is_some() {
            return Err(ObjectError::Corrupt {
                kind: "commit",
                message: "second parent without a first parent".into(),
            });
        }
        Ok(commit)
    }

    /// Content address of this commit.
    pub fn id(&self) -> ObjectId {
        ObjectId::hash_bytes(&self.encode())
    }
}
