//! merge::engine
//!
//! Merge orchestration.
//!
//! # Lifecycle
//!
//! ```text
//! Start -> ResolveRefs -> ComputeMergeBase -> FastForward   -> Done
//!                                          -> ThreeWayMerge -> Clean      -> Done
//!                                                           -> Conflicted -> Done
//! (any phase) -> Error
//! ```
//!
//! A run reaching `Conflicted` halts only under [`MergeStrategy::Manual`]:
//! markers are written, `MERGE_HEAD` is recorded and no commit is made.
//! Under the other strategies every unresolved path keeps our version and
//! the merge commit is written as usual.
//!
//! ```text
//! Conflicted --manual--> halt (markers, MERGE_HEAD)
//!            --auto----> commit (unresolved paths keep ours)
//! ```
//!
//! Every transition is logged at debug level and recorded in
//! [`MergeOutcome::phases`].
//!
//! # Invariants
//!
//! - Staged changes abort the merge before any graph work
//! - A merge commit is only written after the whole tree merge succeeded
//! - Fast-forward and up-to-date merges write no objects
//! - A manual halt never produces a commit; it leaves `MERGE_HEAD` and the
//!   unmerged paths behind, and the next commit records both parents once
//!   every unmerged path is staged again
//!
//! # Example
//!
//! ```ignore
//! let engine = MergeEngine::new(&store, &refs);
//! let outcome = engine.merge(&mut worktree, &theirs, &options, &author)?;
//! if outcome.status == MergeStatus::Conflicted {
//!     // manual strategy: markers are in the working tree
//!     for conflict in outcome.unresolved() { /* report */ }
//! }
//! ```

use std::fmt;

use thiserror::Error;

use crate::core::graph::{merge_base, GraphError};
use crate::core::object::{Commit, Tree};
use crate::core::types::{BranchName, ObjectId, RefName, UtcTimestamp};
use crate::merge::strategy::{MergeOptions, MergeStrategy};
use crate::merge::tree::{MergeConflict, TreeMerger};
use crate::similarity::SimilarityOracle;
use crate::store::objects::{ObjectStore, StoreError};
use crate::store::refs::{RefError, RefStore};
use crate::worktree::{WorkTreeError, WorkingTree};

/// Errors that abort a merge. Conflicts are not errors.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Staged changes would be overwritten.
    #[error("cannot merge with staged changes: {}", staged.join(", "))]
    DirtyWorkingState { staged: Vec<String> },

    /// `HEAD` does not name a branch.
    #[error("cannot merge on a detached HEAD; check out a branch first")]
    DetachedHead,

    /// A previous merge is still waiting to be committed.
    #[error("a merge is already in progress; commit it first")]
    MergeInProgress,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ref(#[from] RefError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    WorkTree(#[from] WorkTreeError),
}

/// States of a single merge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePhase {
    Start,
    ResolveRefs,
    ComputeMergeBase,
    FastForward,
    ThreeWayMerge,
    Clean,
    Conflicted,
    Done,
    Error,
}

impl fmt::Display for MergePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::ResolveRefs => "resolve-refs",
            Self::ComputeMergeBase => "compute-merge-base",
            Self::FastForward => "fast-forward",
            Self::ThreeWayMerge => "three-way-merge",
            Self::Clean => "clean",
            Self::Conflicted => "conflicted",
            Self::Done => "done",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// How a merge ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStatus {
    /// Our branch was moved to their tip.
    FastForward,
    /// Their tip is already part of our history.
    UpToDate,
    /// Three-way merge without conflicts.
    Clean,
    /// Conflicts occurred and the strategy settled all of them.
    AutoResolved,
    /// A merge commit was written; unresolved paths keep our version.
    PartiallyMerged,
    /// Manual strategy: conflicts were left in the working tree.
    Conflicted,
}

impl MergeStatus {
    pub fn is_fast_forward(self) -> bool {
        self == Self::FastForward
    }
}

/// Result of a merge run.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub status: MergeStatus,
    /// Branch that received the merge.
    pub ours_branch: BranchName,
    /// Our tip before the merge; `None` on an unborn branch.
    pub ours: Option<ObjectId>,
    pub theirs: ObjectId,
    pub base: Option<ObjectId>,
    /// New merge commit, if one was written.
    pub commit: Option<ObjectId>,
    /// Where our branch points afterwards.
    pub head: ObjectId,
    /// Every conflict met, resolved or not.
    pub conflicts: Vec<MergeConflict>,
    /// The merged tree was staged instead of committed.
    pub staged_only: bool,
    pub phases: Vec<MergePhase>,
}

impl MergeOutcome {
    pub fn unresolved(&self) -> impl Iterator<Item = &MergeConflict> {
        self.conflicts.iter().filter(|c| !c.is_resolved())
    }

    pub fn is_fast_forward(&self) -> bool {
        self.status.is_fast_forward()
    }
}

/// Default message of a merge commit.
pub fn default_merge_message(theirs: &BranchName, ours: &BranchName) -> String {
    format!("Merge branch '{theirs}' into {ours}")
}

/// Records phase transitions of one run.
struct Transitions(Vec<MergePhase>);

impl Transitions {
    fn new() -> Self {
        tracing::debug!(phase = %MergePhase::Start, "merge phase");
        Self(vec![MergePhase::Start])
    }

    fn enter(&mut self, phase: MergePhase) {
        tracing::debug!(phase = %phase, "merge phase");
        self.0.push(phase);
    }
}

/// Drives a merge of another branch into the checked-out branch.
pub struct MergeEngine<'a> {
    store: &'a ObjectStore,
    refs: &'a RefStore,
    oracle: Option<&'a dyn SimilarityOracle>,
}

impl<'a> MergeEngine<'a> {
    pub fn new(store: &'a ObjectStore, refs: &'a RefStore) -> Self {
        Self {
            store,
            refs,
            oracle: None,
        }
    }

    /// Oracle used when [`MergeOptions::semantic`] is set.
    pub fn with_oracle(mut self, oracle: &'a dyn SimilarityOracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Merge branch `theirs` into the current branch.
    pub fn merge<W: WorkingTree + ?Sized>(
        &self,
        worktree: &mut W,
        theirs: &BranchName,
        options: &MergeOptions,
        author: &str,
    ) -> Result<MergeOutcome, MergeError> {
        let mut phases = Transitions::new();
        match self.run(&mut phases, worktree, theirs, options, author) {
            Ok(mut outcome) => {
                phases.enter(MergePhase::Done);
                outcome.phases = phases.0;
                Ok(outcome)
            }
            Err(e) => {
                phases.enter(MergePhase::Error);
                tracing::debug!(error = %e, "merge aborted");
                Err(e)
            }
        }
    }

    fn run<W: WorkingTree + ?Sized>(
        &self,
        phases: &mut Transitions,
        worktree: &mut W,
        theirs_branch: &BranchName,
        options: &MergeOptions,
        author: &str,
    ) -> Result<MergeOutcome, MergeError> {
        if self.refs.merge_head()?.is_some() {
            return Err(MergeError::MergeInProgress);
        }
        let staged = worktree.staged_entries();
        if !staged.is_empty() {
            return Err(MergeError::DirtyWorkingState {
                staged: staged.into_keys().collect(),
            });
        }

        phases.enter(MergePhase::ResolveRefs);
        let ours_branch = self.refs.current_branch()?.ok_or(MergeError::DetachedHead)?;
        let ours_ref = RefName::for_branch(&ours_branch);
        let theirs = self.refs.resolve(&RefName::for_branch(theirs_branch))?;
        let ours = self.refs.try_resolve(&ours_ref)?;

        let mut outcome = MergeOutcome {
            status: MergeStatus::UpToDate,
            ours_branch: ours_branch.clone(),
            ours: ours.clone(),
            theirs: theirs.clone(),
            base: None,
            commit: None,
            head: theirs.clone(),
            conflicts: Vec::new(),
            staged_only: false,
            phases: Vec::new(),
        };

        let Some(ours) = ours else {
            // Unborn branch: adopt their history as is.
            phases.enter(MergePhase::FastForward);
            self.fast_forward(worktree, &ours_ref, &theirs)?;
            outcome.status = MergeStatus::FastForward;
            return Ok(outcome);
        };
        outcome.head = ours.clone();

        phases.enter(MergePhase::ComputeMergeBase);
        let base = merge_base(self.store, &ours, &theirs)?;
        outcome.base = Some(base.clone());

        if base == theirs {
            tracing::debug!(theirs = %theirs.short(12), "already up to date");
            return Ok(outcome);
        }
        if base == ours {
            phases.enter(MergePhase::FastForward);
            self.fast_forward(worktree, &ours_ref, &theirs)?;
            outcome.status = MergeStatus::FastForward;
            outcome.head = theirs;
            return Ok(outcome);
        }

        phases.enter(MergePhase::ThreeWayMerge);
        let base_tree = self.store.tree_of_commit(&base)?;
        let our_tree = self.store.tree_of_commit(&ours)?;
        let their_tree = self.store.tree_of_commit(&theirs)?;

        let mut merger = TreeMerger::new(self.store, options.strategy);
        if options.semantic {
            if let Some(oracle) = self.oracle {
                merger = merger.with_oracle(oracle);
            }
        }
        let merged = merger.merge(&base_tree, &our_tree, &their_tree)?;

        outcome.conflicts = merged.conflicts.clone();
        if !merged.has_unresolved() {
            phases.enter(MergePhase::Clean);
            outcome.status = if merged.conflicts.is_empty() {
                MergeStatus::Clean
            } else {
                MergeStatus::AutoResolved
            };
        } else if options.strategy == MergeStrategy::Manual {
            phases.enter(MergePhase::Conflicted);
            self.halt(worktree, &our_tree, &merged.tree, &merged.conflicts, &theirs)?;
            outcome.status = MergeStatus::Conflicted;
            return Ok(outcome);
        } else {
            phases.enter(MergePhase::Conflicted);
            tracing::debug!(
                unresolved = merged.unresolved().count(),
                "keeping our side for unresolved paths"
            );
            outcome.status = MergeStatus::PartiallyMerged;
        }
        let tree = keep_ours_for_unresolved(&our_tree, &merged.tree, &merged.conflicts);

        if options.no_commit {
            worktree.stage_tree(self.store, &tree)?;
            self.refs.set_merge_head(&theirs)?;
            outcome.staged_only = true;
            return Ok(outcome);
        }

        let message = options
            .message
            .clone()
            .unwrap_or_else(|| default_merge_message(theirs_branch, &ours_branch));
        let tree_id = self.store.put_tree(&tree)?;
        let commit = Commit {
            tree: tree_id,
            parent: Some(ours),
            parent2: Some(theirs),
            author: author.to_string(),
            message,
            timestamp: UtcTimestamp::now(),
        };
        let commit_id = self.store.put_commit(&commit)?;
        self.refs.update(&ours_ref, &commit_id)?;
        worktree.materialize(self.store, &tree)?;

        tracing::debug!(commit = %commit_id.short(12), "created merge commit");
        outcome.commit = Some(commit_id.clone());
        outcome.head = commit_id;
        Ok(outcome)
    }

    fn fast_forward<W: WorkingTree + ?Sized>(
        &self,
        worktree: &mut W,
        ours_ref: &RefName,
        theirs: &ObjectId,
    ) -> Result<(), MergeError> {
        let tree = self.store.tree_of_commit(theirs)?;
        self.refs.update(ours_ref, theirs)?;
        worktree.materialize(self.store, &tree)?;
        Ok(())
    }

    /// Leave the working tree holding the merge result with conflict markers
    /// in unresolved files, and record `MERGE_HEAD`.
    fn halt<W: WorkingTree + ?Sized>(
        &self,
        worktree: &mut W,
        our_tree: &Tree,
        merged: &Tree,
        conflicts: &[MergeConflict],
        theirs: &ObjectId,
    ) -> Result<(), MergeError> {
        let partial = keep_ours_for_unresolved(our_tree, merged, conflicts);
        let unresolved: Vec<MergeConflict> =
            conflicts.iter().filter(|c| !c.is_resolved()).cloned().collect();

        worktree.materialize(self.store, &partial)?;
        worktree.write_conflicts(&unresolved)?;
        self.refs.set_merge_head(theirs)?;
        tracing::debug!(conflicts = unresolved.len(), "merge halted with conflicts");
        Ok(())
    }
}

/// `merged` plus our entry for every unresolved path.
fn keep_ours_for_unresolved(our_tree: &Tree, merged: &Tree, conflicts: &[MergeConflict]) -> Tree {
    let mut tree = merged.clone();
    for conflict in conflicts.iter().filter(|c| !c.is_resolved()) {
        if let Some(entry) = our_tree.get(&conflict.path) {
            tree.insert_from_tree(&conflict.path, entry.clone());
        }
    }
    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::paths::KitPaths;
    use crate::similarity::{OracleError, Similarity};
    use crate::worktree::MemoryWorkTree;
    use tempfile::TempDir;

    const AUTHOR: &str = "Test <test@example.com>";

    struct Fixture {
        _temp: TempDir,
        store: ObjectStore,
        refs: RefStore,
        worktree: MemoryWorkTree,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let paths = KitPaths::new(temp.path().to_path_buf());
            let store = ObjectStore::new(paths.objects_dir());
            store.init().unwrap();
            let refs = RefStore::new(paths);
            refs.init().unwrap();
            refs.update_symbolic(&RefName::head(), &RefName::for_branch(&branch("main")))
                .unwrap();
            Self {
                _temp: temp,
                store,
                refs,
                worktree: MemoryWorkTree::new(),
            }
        }

        /// Commit `files` on `on`, with the branch's tip as parent.
        fn commit(&self, on: &str, files: &[(&str, &str)], message: &str) -> ObjectId {
            let tree = Tree::from_blobs(
                files
                    .iter()
                    .map(|(p, c)| (p.to_string(), self.store.put(c.as_bytes()).unwrap())),
            )
            .unwrap();
            let name = RefName::for_branch(&branch(on));
            let commit = Commit {
                tree: self.store.put_tree(&tree).unwrap(),
                parent: self.refs.try_resolve(&name).unwrap(),
                parent2: None,
                author: AUTHOR.into(),
                message: message.into(),
                timestamp: UtcTimestamp::now(),
            };
            let id = self.store.put_commit(&commit).unwrap();
            self.refs.update(&name, &id).unwrap();
            id
        }

        fn branch_at(&self, name: &str, id: &ObjectId) {
            self.refs
                .update(&RefName::for_branch(&branch(name)), id)
                .unwrap();
        }

        fn checkout(&mut self, name: &str) {
            let name = RefName::for_branch(&branch(name));
            self.refs.update_symbolic(&RefName::head(), &name).unwrap();
            let tree = self
                .store
                .tree_of_commit(&self.refs.resolve(&name).unwrap())
                .unwrap();
            self.worktree.materialize(&self.store, &tree).unwrap();
        }

        fn tip(&self, name: &str) -> ObjectId {
            self.refs.resolve(&RefName::for_branch(&branch(name))).unwrap()
        }

        fn merge(&mut self, theirs: &str, options: &MergeOptions) -> Result<MergeOutcome, MergeError> {
            MergeEngine::new(&self.store, &self.refs).merge(
                &mut self.worktree,
                &branch(theirs),
                options,
                AUTHOR,
            )
        }

        /// main: base -> ours edit; feature: base -> theirs edit.
        fn diverged(&mut self, base: &str, ours: &str, theirs: &str) {
            let root = self.commit("main", &[("f.txt", base), ("same.txt", "s\n")], "root");
            self.branch_at("feature", &root);
            self.commit("feature", &[("f.txt", theirs), ("same.txt", "s\n")], "theirs");
            self.commit("main", &[("f.txt", ours), ("same.txt", "s\n")], "ours");
            self.checkout("main");
        }
    }

    fn branch(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    mod fast_forward {
        use super::*;

        #[test]
        fn ancestor_branch_moves_to_their_tip() {
            let mut f = Fixture::new();
            let c1 = f.commit("main", &[("a", "1\n")], "c1");
            f.branch_at("feature", &c1);
            let c2 = f.commit("main", &[("a", "2\n")], "c2");
            f.checkout("feature");

            let outcome = f.merge("main", &MergeOptions::default()).unwrap();
            assert!(outcome.is_fast_forward());
            assert!(outcome.conflicts.is_empty());
            assert_eq!(outcome.commit, None);
            assert_eq!(f.tip("feature"), c2);
            assert_eq!(f.worktree.file("a").as_deref(), Some("2\n"));
            assert_eq!(
                outcome.phases,
                vec![
                    MergePhase::Start,
                    MergePhase::ResolveRefs,
                    MergePhase::ComputeMergeBase,
                    MergePhase::FastForward,
                    MergePhase::Done,
                ]
            );
        }

        #[test]
        fn merging_an_ancestor_is_up_to_date() {
            let mut f = Fixture::new();
            let c1 = f.commit("main", &[("a", "1\n")], "c1");
            f.branch_at("old", &c1);
            let c2 = f.commit("main", &[("a", "2\n")], "c2");
            f.checkout("main");

            let outcome = f.merge("old", &MergeOptions::default()).unwrap();
            assert_eq!(outcome.status, MergeStatus::UpToDate);
            assert_eq!(f.tip("main"), c2);
        }

        #[test]
        fn unborn_branch_adopts_their_tip() {
            let mut f = Fixture::new();
            let c1 = f.commit("feature", &[("a", "1\n")], "c1");

            let outcome = f.merge("feature", &MergeOptions::default()).unwrap();
            assert!(outcome.is_fast_forward());
            assert_eq!(f.tip("main"), c1);
        }
    }

    mod three_way {
        use super::*;

        #[test]
        fn disjoint_edits_create_a_two_parent_commit() {
            let mut f = Fixture::new();
            f.diverged("a\nb\nc\n", "a\nB\nc\n", "a\nb\nC\n");
            let ours = f.tip("main");
            let theirs = f.tip("feature");

            let outcome = f.merge("feature", &MergeOptions::default()).unwrap();
            assert_eq!(outcome.status, MergeStatus::Clean);

            let commit_id = outcome.commit.unwrap();
            assert_eq!(f.tip("main"), commit_id);
            let commit = f.store.get_commit(&commit_id).unwrap();
            assert_eq!(commit.parent, Some(ours));
            assert_eq!(commit.parent2, Some(theirs));
            assert_eq!(commit.message, "Merge branch 'feature' into main");
            assert_eq!(f.worktree.file("f.txt").as_deref(), Some("a\nB\nC\n"));
            assert!(f.refs.merge_head().unwrap().is_none());
        }

        #[test]
        fn custom_message_is_used() {
            let mut f = Fixture::new();
            f.diverged("a\nb\nc\n", "a\nB\nc\n", "a\nb\nC\n");
            let options = MergeOptions {
                message: Some("combine".into()),
                ..MergeOptions::default()
            };
            let outcome = f.merge("feature", &options).unwrap();
            let commit = f.store.get_commit(&outcome.commit.unwrap()).unwrap();
            assert_eq!(commit.message, "combine");
        }

        #[test]
        fn side_strategy_auto_resolves() {
            let mut f = Fixture::new();
            f.diverged("x\n", "y\n", "z\n");
            let outcome = f
                .merge("feature", &MergeOptions::with_strategy(MergeStrategy::Ours))
                .unwrap();
            assert_eq!(outcome.status, MergeStatus::AutoResolved);
            assert_eq!(outcome.conflicts.len(), 1);
            assert!(outcome.commit.is_some());
            assert_eq!(f.worktree.file("f.txt").as_deref(), Some("y\n"));
        }

        #[test]
        fn no_commit_stages_the_result() {
            let mut f = Fixture::new();
            f.diverged("a\nb\nc\n", "a\nB\nc\n", "a\nb\nC\n");
            let before = f.tip("main");
            let options = MergeOptions {
                no_commit: true,
                ..MergeOptions::default()
            };

            let outcome = f.merge("feature", &options).unwrap();
            assert!(outcome.staged_only);
            assert_eq!(outcome.commit, None);
            assert_eq!(f.tip("main"), before);
            assert_eq!(f.refs.merge_head().unwrap(), Some(f.tip("feature")));
            assert!(f.worktree.staged_entries().contains_key("f.txt"));
        }
    }

    mod conflicts {
        use super::*;

        #[test]
        fn manual_halts_with_markers() {
            let mut f = Fixture::new();
            f.diverged("x\n", "y\n", "z\n");
            let before = f.tip("main");

            let outcome = f
                .merge("feature", &MergeOptions::with_strategy(MergeStrategy::Manual))
                .unwrap();
            assert_eq!(outcome.status, MergeStatus::Conflicted);
            assert_eq!(outcome.commit, None);
            assert_eq!(f.tip("main"), before);
            assert_eq!(outcome.unresolved().count(), 1);
            assert_eq!(
                f.worktree.unmerged_paths().into_iter().collect::<Vec<_>>(),
                ["f.txt"]
            );

            let content = f.worktree.file("f.txt").unwrap();
            assert!(content.contains("<<<<<<< OURS"));
            assert!(content.contains('y') && content.contains('z'));
            assert_eq!(f.refs.merge_head().unwrap(), Some(f.tip("feature")));
            assert!(outcome.phases.contains(&MergePhase::Conflicted));
        }

        #[test]
        fn auto_commits_and_keeps_ours_for_true_conflicts() {
            let mut f = Fixture::new();
            f.diverged("x\n", "y\n", "z\n");
            let ours = f.tip("main");
            let theirs = f.tip("feature");

            let outcome = f.merge("feature", &MergeOptions::default()).unwrap();
            assert_eq!(outcome.status, MergeStatus::PartiallyMerged);
            assert_eq!(outcome.unresolved().count(), 1);
            assert_eq!(outcome.unresolved().next().unwrap().path, "f.txt");

            let commit_id = outcome.commit.unwrap();
            assert_eq!(f.tip("main"), commit_id);
            let commit = f.store.get_commit(&commit_id).unwrap();
            assert_eq!(commit.parent, Some(ours));
            assert_eq!(commit.parent2, Some(theirs));
            assert_eq!(f.worktree.file("f.txt").as_deref(), Some("y\n"));
            assert!(f.worktree.unmerged_paths().is_empty());
            assert!(f.refs.merge_head().unwrap().is_none());
            assert_eq!(
                outcome.phases,
                vec![
                    MergePhase::Start,
                    MergePhase::ResolveRefs,
                    MergePhase::ComputeMergeBase,
                    MergePhase::ThreeWayMerge,
                    MergePhase::Conflicted,
                    MergePhase::Done,
                ]
            );
        }

        #[test]
        fn pending_merge_blocks_another() {
            let mut f = Fixture::new();
            f.diverged("x\n", "y\n", "z\n");
            let manual = MergeOptions::with_strategy(MergeStrategy::Manual);
            f.merge("feature", &manual).unwrap();
            assert!(matches!(
                f.merge("feature", &manual),
                Err(MergeError::MergeInProgress)
            ));
        }

        struct AlwaysSimilar;

        impl SimilarityOracle for AlwaysSimilar {
            fn similarity(&self, _: &str, _: &str) -> Result<Similarity, OracleError> {
                Ok(Similarity {
                    score: 0.95,
                    is_similar: true,
                })
            }
        }

        #[test]
        fn semantic_option_consults_the_oracle() {
            let mut f = Fixture::new();
            let root = f.commit("main", &[("lib.rs", "")], "root");
            f.branch_at("feature", &root);
            f.commit("feature", &[("lib.rs", "fn a() {}\n")], "theirs");
            f.commit("main", &[("lib.rs", "fn a() { }\n// more\n")], "ours");
            f.checkout("main");

            let options = MergeOptions {
                semantic: true,
                ..MergeOptions::default()
            };
            let oracle = AlwaysSimilar;
            let outcome = MergeEngine::new(&f.store, &f.refs)
                .with_oracle(&oracle)
                .merge(&mut f.worktree, &branch("feature"), &options, AUTHOR)
                .unwrap();
            assert_eq!(outcome.status, MergeStatus::AutoResolved);
            assert_eq!(
                f.worktree.file("lib.rs").as_deref(),
                Some("fn a() { }\n// more\n")
            );
        }

        #[test]
        fn manual_strategy_ignores_the_oracle() {
            let mut f = Fixture::new();
            let root = f.commit("main", &[("lib.rs", "")], "root");
            f.branch_at("feature", &root);
            f.commit("feature", &[("lib.rs", "fn a() {}\n")], "theirs");
            f.commit("main", &[("lib.rs", "fn a() { }\n// more\n")], "ours");
            f.checkout("main");

            let options = MergeOptions {
                semantic: true,
                ..MergeOptions::with_strategy(MergeStrategy::Manual)
            };
            let oracle = AlwaysSimilar;
            let outcome = MergeEngine::new(&f.store, &f.refs)
                .with_oracle(&oracle)
                .merge(&mut f.worktree, &branch("feature"), &options, AUTHOR)
                .unwrap();
            assert_eq!(outcome.status, MergeStatus::Conflicted);
            assert_eq!(outcome.commit, None);
            assert!(f.worktree.file("lib.rs").unwrap().contains("<<<<<<< OURS"));
        }
    }

    mod preconditions {
        use super::*;

        #[test]
        fn staged_changes_fail_before_graph_work() {
            let mut f = Fixture::new();
            f.diverged("x\n", "y\n", "z\n");
            f.worktree
                .stage("pending.txt", ObjectId::hash_bytes(b"p"))
                .unwrap();

            let err = f.merge("feature", &MergeOptions::default()).unwrap_err();
            match err {
                MergeError::DirtyWorkingState { staged } => assert_eq!(staged, vec!["pending.txt"]),
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn detached_head_is_rejected() {
            let mut f = Fixture::new();
            let c1 = f.commit("main", &[("a", "1\n")], "c1");
            f.branch_at("feature", &c1);
            f.refs.update(&RefName::head(), &c1).unwrap();
            assert!(matches!(
                f.merge("feature", &MergeOptions::default()),
                Err(MergeError::DetachedHead)
            ));
        }

        #[test]
        fn unknown_branch_is_a_ref_error() {
            let mut f = Fixture::new();
            f.commit("main", &[("a", "1\n")], "c1");
            assert!(matches!(
                f.merge("missing", &MergeOptions::default()),
                Err(MergeError::Ref(RefError::NotFound { .. }))
            ));
        }
    }
}
