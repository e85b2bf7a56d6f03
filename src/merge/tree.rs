//! merge::tree
//!
//! Three-way merge of tree snapshots.
//!
//! # Case Table
//!
//! Every path present in base, ours or theirs is classified exactly once:
//!
//! | base    | ours     | theirs   | result                                |
//! |---------|----------|----------|---------------------------------------|
//! | any     | X        | X        | X (unchanged or convergent edit/add)  |
//! | B       | B        | T        | T                                     |
//! | B       | O        | B        | O                                     |
//! | B       | O        | T        | file merge against B                  |
//! | absent  | O        | T        | file merge against an empty base      |
//! | present | O        | absent   | O (deletion is not a conflict)        |
//! | present | absent   | T        | T (deletion is not a conflict)        |
//! | absent  | O        | absent   | O                                     |
//! | absent  | absent   | T        | T                                     |
//! | any     | absent   | absent   | omitted                               |
//!
//! A file merge that collides becomes a [`MergeConflict`]. When the strategy
//! settles it, the conflict carries the resolution and the path is kept;
//! otherwise the path is left out of the merged tree.

use std::collections::BTreeSet;

use crate::core::object::{Tree, TreeEntry};
use crate::core::types::ObjectId;
use crate::merge::file::{conflict_markers, merge_files, merge_files_with_oracle, FileMergeOutcome};
use crate::merge::strategy::MergeStrategy;
use crate::similarity::SimilarityOracle;
use crate::store::objects::{ObjectStore, StoreError};

/// A path whose edits collided. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConflict {
    pub path: String,
    /// Common ancestor content; empty when both sides added the file.
    pub base: String,
    pub ours: String,
    pub theirs: String,
    /// Content chosen by the strategy or oracle, if any.
    pub resolution: Option<String>,
}

impl MergeConflict {
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    /// What the working file should hold: the resolution, or a marker block.
    pub fn materialized(&self) -> String {
        match &self.resolution {
            Some(content) => content.clone(),
            None => conflict_markers(&self.ours, &self.theirs),
        }
    }
}

/// Merged tree plus the conflicts met on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeMerge {
    /// Every resolved path; unresolved conflicts are absent.
    pub tree: Tree,
    pub conflicts: Vec<MergeConflict>,
}

impl TreeMerge {
    pub fn unresolved(&self) -> impl Iterator<Item = &MergeConflict> {
        self.conflicts.iter().filter(|c| !c.is_resolved())
    }

    pub fn has_unresolved(&self) -> bool {
        self.unresolved().next().is_some()
    }
}

/// Three-way tree merger bound to an object store.
pub struct TreeMerger<'a> {
    store: &'a ObjectStore,
    strategy: MergeStrategy,
    oracle: Option<&'a dyn SimilarityOracle>,
}

impl<'a> TreeMerger<'a> {
    pub fn new(store: &'a ObjectStore, strategy: MergeStrategy) -> Self {
        Self {
            store,
            strategy,
            oracle: None,
        }
    }

    /// Consult `oracle` on collisions in source files.
    pub fn with_oracle(mut self, oracle: &'a dyn SimilarityOracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Merge `ours` and `theirs` against `base`.
    ///
    /// Merged file contents are written to the store as blobs. Store errors
    /// abort the merge.
    pub fn merge(&self, base: &Tree, ours: &Tree, theirs: &Tree) -> Result<TreeMerge, StoreError> {
        let paths: BTreeSet<&String> = base
            .paths()
            .chain(ours.paths())
            .chain(theirs.paths())
            .collect();

        let mut result = TreeMerge::default();
        for path in paths {
            let b = base.get(path);
            let o = ours.get(path);
            let t = theirs.get(path);

            let picked = match (b, o, t) {
                (_, Some(o), Some(t)) if o.id == t.id => Some(o.clone()),
                (Some(b), Some(o), Some(t)) if b.id == o.id => Some(t.clone()),
                (Some(b), Some(o), Some(t)) if b.id == t.id => Some(o.clone()),
                (b, Some(o), Some(t)) => {
                    self.merge_file(path, b.map(|e| &e.id), o, t, &mut result.conflicts)?
                }
                (_, Some(o), None) => Some(o.clone()),
                (_, None, Some(t)) => Some(t.clone()),
                (_, None, None) => None,
            };

            if let Some(entry) = picked {
                result.tree.insert_from_tree(path, entry);
            }
        }

        tracing::debug!(
            paths = result.tree.len(),
            conflicts = result.conflicts.len(),
            "three-way tree merge finished"
        );
        Ok(result)
    }

    fn text(&self, id: Option<&ObjectId>) -> Result<String, StoreError> {
        match id {
            Some(id) => Ok(String::from_utf8_lossy(&self.store.get(id)?).into_owned()),
            None => Ok(String::new()),
        }
    }

    fn merge_file(
        &self,
        path: &str,
        base: Option<&ObjectId>,
        ours: &TreeEntry,
        theirs: &TreeEntry,
        conflicts: &mut Vec<MergeConflict>,
    ) -> Result<Option<TreeEntry>, StoreError> {
        let base_text = self.text(base)?;
        let our_text = self.text(Some(&ours.id))?;
        let their_text = self.text(Some(&theirs.id))?;

        let outcome = match self.oracle {
            Some(oracle) => merge_files_with_oracle(
                oracle,
                path,
                &base_text,
                &our_text,
                &their_text,
                self.strategy,
            ),
            None => merge_files(&base_text, &our_text, &their_text, self.strategy),
        };

        let resolution = match &outcome {
            FileMergeOutcome::Clean(_) => None,
            FileMergeOutcome::Resolved(content) => Some(content.clone()),
            FileMergeOutcome::Conflicted(_) => None,
        };
        if outcome.had_conflict() {
            tracing::debug!(path, resolved = resolution.is_some(), "file merge conflict");
            conflicts.push(MergeConflict {
                path: path.to_string(),
                base: base_text,
                ours: our_text,
                theirs: their_text,
                resolution,
            });
        }

        match outcome {
            FileMergeOutcome::Clean(content) | FileMergeOutcome::Resolved(content) => {
                let id = self.store.put(content.as_bytes())?;
                Ok(Some(TreeEntry {
                    id,
                    ..ours.clone()
                }))
            }
            FileMergeOutcome::Conflicted(_) => Ok(None),
        }
    }
}
