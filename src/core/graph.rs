//! core::graph
//!
//! Commit graph navigation: ancestry and merge-base resolution.
//!
//! # Architecture
//!
//! The commit graph is a DAG where:
//! - Nodes are commits, keyed by [`ObjectId`]
//! - Edges point from child to parent (`parent`, then `parent2` for merges)
//! - Roots are commits without a first parent
//!
//! Parent lookup is abstracted behind [`Ancestry`], so the traversal code
//! runs against the object store in production and a plain map in tests.
//!
//! # Invariants
//!
//! - Traversal uses an explicit queue and a visited set; history depth never
//!   grows the call stack
//! - `merge_base(a, a) == a`
//! - A lookup failure aborts the traversal; nothing is silently skipped
//!
//! # Merge Base
//!
//! The merge base is found in two breadth-first passes: collect everything
//! reachable from `a`, then walk from `b` and stop at the first commit already
//! seen from `a`. With criss-cross histories this returns *a* common ancestor
//! in discovery order, which is not necessarily the unique lowest one.

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;

use super::types::ObjectId;
use crate::store::objects::{ObjectStore, StoreError};

/// Errors from graph traversal.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The two histories never intersect.
    #[error("no common ancestor between {a} and {b}")]
    NoCommonAncestor { a: ObjectId, b: ObjectId },

    /// A commit could not be loaded.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Source of parent edges for a commit.
pub trait Ancestry {
    /// Parents of `id` in traversal order (first parent first).
    fn parents(&self, id: &ObjectId) -> Result<Vec<ObjectId>, GraphError>;
}

impl Ancestry for ObjectStore {
    fn parents(&self, id: &ObjectId) -> Result<Vec<ObjectId>, GraphError> {
        let commit = self.get_commit(id)?;
        Ok(commit.parents().cloned().collect())
    }
}

/// In-memory parent table, mostly useful for tests and tools.
impl Ancestry for HashMap<ObjectId, Vec<ObjectId>> {
    fn parents(&self, id: &ObjectId) -> Result<Vec<ObjectId>, GraphError> {
        self.get(id)
            .cloned()
            .ok_or_else(|| GraphError::Store(StoreError::NotFound { id: id.clone() }))
    }
}

/// Every commit reachable from `start`, including `start` itself.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use kitwork::core::graph::ancestors;
/// use kitwork::core::types::ObjectId;
///
/// let root = ObjectId::hash_bytes(b"root");
/// let tip = ObjectId::hash_bytes(b"tip");
/// let graph = HashMap::from([
///     (root.clone(), vec![]),
///     (tip.clone(), vec![root.clone()]),
/// ]);
///
/// let reachable = ancestors(&graph, &tip).unwrap();
/// assert!(reachable.contains(&root));
/// assert!(reachable.contains(&tip));
/// ```
pub fn ancestors<G: Ancestry + ?Sized>(
    graph: &G,
    start: &ObjectId,
) -> Result<HashSet<ObjectId>, GraphError> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([start.clone()]);

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current.clone()) {
            continue;
        }
        for parent in graph.parents(&current)? {
            if !visited.contains(&parent) {
                queue.push_back(parent);
            }
        }
    }

    Ok(visited)
}

/// Find a common ancestor of `a` and `b`.
///
/// # Errors
///
/// - [`GraphError::NoCommonAncestor`] if the histories are disjoint
/// - [`GraphError::Store`] if any commit on the way cannot be read
pub fn merge_base<G: Ancestry + ?Sized>(
    graph: &G,
    a: &ObjectId,
    b: &ObjectId,
) -> Result<ObjectId, GraphError> {
    if a == b {
        return Ok(a.clone());
    }

    let from_a = ancestors(graph, a)?;
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([b.clone()]);

    while let Some(current) = queue.pop_front() {
        if from_a.contains(&current) {
            tracing::debug!(a = %a.short(12), b = %b.short(12), base = %current.short(12), "found merge base");
            return Ok(current);
        }
        if !visited.insert(current.clone()) {
            continue;
        }
        queue.extend(graph.parents(&current)?);
    }

    Err(GraphError::NoCommonAncestor {
        a: a.clone(),
        b: b.clone(),
    })
}

/// Check whether `ancestor` is reachable from `descendant`.
///
/// A commit counts as its own ancestor.
pub fn is_ancestor<G: Ancestry + ?Sized>(
    graph: &G,
    ancestor: &ObjectId,
    descendant: &ObjectId,
) -> Result<bool, GraphError> {
    if ancestor == descendant {
        return Ok(true);
    }
    Ok(ancestors(graph, descendant)?.contains(ancestor))
}

/// First-parent chain starting at `start`, newest first.
///
/// Stops after `limit` commits when a limit is given.
pub fn first_parent_history<G: Ancestry + ?Sized>(
    graph: &G,
    start: &ObjectId,
    limit: Option<usize>,
) -> Result<Vec<ObjectId>, GraphError> {
    let mut history = Vec::new();
    let mut seen = HashSet::new();
    let mut current = Some(start.clone());

    while let Some(id) = current {
        if limit.is_some_and(|n| history.len() >= n) || !seen.insert(id.clone()) {
            break;
        }
        current = graph.parents(&id)?.into_iter().next();
        history.push(id);
    }

    Ok(history)
}
