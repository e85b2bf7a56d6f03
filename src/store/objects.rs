//! store::objects
//!
//! Content-addressed object database.
//!
//! # Contract
//!
//! - `put(bytes)` is idempotent: identical bytes always yield the same id and
//!   are written at most once.
//! - `get(id)` returns the exact bytes that were stored, or `NotFound`.
//! - Objects are sharded by the first two hex characters of their id to keep
//!   directory fan-out bounded.
//!
//! Writes go to a temporary file in the shard directory and are renamed into
//! place, so a reader never sees a partially written object.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::object::{Commit, ObjectError, Tree};
use crate::core::types::ObjectId;

/// Errors from object store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No object with this id exists.
    #[error("object not found: {id}")]
    NotFound { id: ObjectId },

    /// The object exists but could not be decoded as the expected kind.
    #[error("corrupt object {id}: {message}")]
    CorruptObject { id: ObjectId, message: String },

    /// Filesystem failure.
    #[error("object store i/o error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn corrupt(id: &ObjectId, err: ObjectError) -> Self {
        Self::CorruptObject {
            id: id.clone(),
            message: err.to_string(),
        }
    }
}

/// Findings of a full object database check.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoreReport {
    /// Number of object files examined.
    pub objects: usize,
    /// Objects whose content no longer hashes to their name.
    pub corrupt: Vec<ObjectId>,
    /// Files in the object directory that are not named like an object.
    pub stray: Vec<PathBuf>,
}

impl StoreReport {
    pub fn is_clean(&self) -> bool {
        self.corrupt.is_empty() && self.stray.is_empty()
    }
}

/// Filesystem-backed object store rooted at `.kit/objects`.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    /// Open (without creating) a store at `root`.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the root directory if needed.
    pub fn init(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|e| StoreError::io(&self.root, e))
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let (shard, rest) = id.fanout();
        self.root.join(shard).join(rest)
    }

    /// Check whether an object is present.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.object_path(id).is_file()
    }

    /// Store raw bytes and return their id.
    pub fn put(&self, bytes: &[u8]) -> Result<ObjectId, StoreError> {
        let id = ObjectId::hash_bytes(bytes);
        let path = self.object_path(&id);
        if path.is_file() {
            tracing::trace!(id = %id.short(12), "object already stored");
            return Ok(id);
        }

        let shard = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&shard).map_err(|e| StoreError::io(&shard, e))?;

        let temp = shard.join(format!(".{}.tmp-{}", id.fanout().1, std::process::id()));
        let mut file = fs::File::create(&temp).map_err(|e| StoreError::io(&temp, e))?;
        file.write_all(bytes)
            .and_then(|()| file.sync_all())
            .map_err(|e| StoreError::io(&temp, e))?;
        fs::rename(&temp, &path).map_err(|e| StoreError::io(&path, e))?;

        tracing::debug!(id = %id.short(12), size = bytes.len(), "stored object");
        Ok(id)
    }

    /// Read the bytes of an object, checking they still hash to `id`.
    pub fn get(&self, id: &ObjectId) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(id);
        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound { id: id.clone() },
            _ => StoreError::io(&path, e),
        })?;
        if ObjectId::hash_bytes(&bytes) != *id {
            return Err(StoreError::CorruptObject {
                id: id.clone(),
                message: "content does not match its id".to_string(),
            });
        }
        Ok(bytes)
    }

    /// Store a tree and return its id.
    pub fn put_tree(&self, tree: &Tree) -> Result<ObjectId, StoreError> {
        self.put(&tree.encode())
    }

    /// Load and decode a tree.
    pub fn get_tree(&self, id: &ObjectId) -> Result<Tree, StoreError> {
        let bytes = self.get(id)?;
        Tree::decode(&bytes).map_err(|e| StoreError::corrupt(id, e))
    }

    /// Store a commit and return its id.
    pub fn put_commit(&self, commit: &Commit) -> Result<ObjectId, StoreError> {
        self.put(&commit.encode())
    }

    /// Load and decode a commit.
    pub fn get_commit(&self, id: &ObjectId) -> Result<Commit, StoreError> {
        let bytes = self.get(id)?;
        Commit::decode(&bytes).map_err(|e| StoreError::corrupt(id, e))
    }

    /// Load the tree a commit points at.
    pub fn tree_of_commit(&self, id: &ObjectId) -> Result<Tree, StoreError> {
        let commit = self.get_commit(id)?;
        self.get_tree(&commit.tree)
    }

    /// Re-hash every stored object and report mismatches.
    pub fn verify(&self) -> Result<StoreReport, StoreError> {
        let mut report = StoreReport::default();
        if !self.root.is_dir() {
            return Ok(report);
        }

        let mut shards: Vec<_> = read_dir_sorted(&self.root)?;
        shards.retain(|p| p.is_dir());
        for shard in shards {
            let prefix = file_name(&shard);
            for file in read_dir_sorted(&shard)? {
                let name = format!("{prefix}{}", file_name(&file));
                let Ok(id) = ObjectId::new(name) else {
                    report.stray.push(file);
                    continue;
                };
                report.objects += 1;
                let bytes = fs::read(&file).map_err(|e| StoreError::io(&file, e))?;
                if ObjectId::hash_bytes(&bytes) != id {
                    tracing::warn!(id = %id, "object content does not match its id");
                    report.corrupt.push(id);
                }
            }
        }
        Ok(report)
    }
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| StoreError::io(dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::io(dir, e))?;
    entries.sort();
    Ok(entries)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
