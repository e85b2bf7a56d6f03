//! repo
//!
//! The repository handle.
//!
//! # Architecture
//!
//! [`Repository`] owns everything one working copy needs:
//!
//! - [`KitPaths`] for the `.kit` layout
//! - the [`ObjectStore`] and [`RefStore`]
//! - the loaded [`Config`]
//! - a [`WorkingTree`] holding the stage and tracked maps
//!
//! There is no process-wide state. Every operation goes through `&self` or
//! `&mut self`, so two handles on two repositories never interfere.
//!
//! # Invariants
//!
//! - Mutating operations hold the [`RepoLock`] for their whole duration
//! - A commit is only written after its tree is fully stored
//! - Staged changes block checkout and merge
//!
//! # Example
//!
//! ```no_run
//! use kitwork::repo::Repository;
//! use std::path::Path;
//!
//! let mut repo = Repository::init(Path::new("/tmp/project"), None)?;
//! std::fs::write("/tmp/project/README", "hello\n")?;
//! repo.add(Path::new("README"))?;
//! let id = repo.commit("initial")?;
//! println!("committed {}", id.short(12));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::core::config::{Config, ConfigError, RepoConfig, DEFAULT_BRANCH};
use crate::core::graph::{first_parent_history, GraphError};
use crate::core::object::{Commit, ObjectError, Tree};
use crate::core::ops::{LockError, RepoLock};
use crate::core::paths::{KitPaths, KIT_DIR};
use crate::core::types::{BranchName, ObjectId, RefName, TypeError, UtcTimestamp};
use crate::diff::tree::{content_diffs, FileDiff};
use crate::merge::engine::{MergeEngine, MergeError, MergeOutcome};
use crate::merge::strategy::MergeOptions;
use crate::similarity::TokenOracle;
use crate::store::objects::{ObjectStore, StoreError, StoreReport};
use crate::store::refs::{RefError, RefStore, RefTarget};
use crate::worktree::{FsWorkTree, WorkTreeError, WorkingTree};

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("not a kit repository (or any parent): {}", path.display())]
    NotARepository { path: PathBuf },

    #[error("repository already exists at {}", path.display())]
    AlreadyInitialized { path: PathBuf },

    #[error("nothing to commit")]
    NothingToCommit,

    /// The operation needs at least one commit on HEAD.
    #[error("no commits yet")]
    NoCommits,

    #[error("branch '{0}' already exists")]
    BranchExists(BranchName),

    #[error("tag '{0}' already exists")]
    TagExists(BranchName),

    #[error("unknown revision '{0}'")]
    UnknownRevision(String),

    #[error("path is outside the repository: {}", path.display())]
    PathOutsideRepository { path: PathBuf },

    #[error("no such file: {path}")]
    FileNotFound { path: String },

    #[error("cannot check out with staged changes: {}", staged.join(", "))]
    DirtyWorkingState { staged: Vec<String> },

    #[error("a merge is in progress; commit it first")]
    MergeInProgress,

    #[error("unresolved conflicts in {}; fix them and 'kit add' each file first", paths.join(", "))]
    UnmergedPaths { paths: Vec<String> },

    #[error("i/o error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    InvalidName(#[from] TypeError),

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ref(#[from] RefError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    WorkTree(#[from] WorkTreeError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A branch and where it points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInfo {
    pub name: BranchName,
    pub tip: ObjectId,
    /// `HEAD` points at this branch.
    pub current: bool,
}

/// One commit of a log walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub id: ObjectId,
    pub commit: Commit,
}

/// What `checkout` ended up pointing `HEAD` at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutTarget {
    Branch(BranchName),
    Detached(ObjectId),
}

/// Findings of [`Repository::verify`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub objects: StoreReport,
    /// References whose target commit is missing or unreadable.
    pub dangling: Vec<(String, ObjectId)>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.objects.is_clean() && self.dangling.is_empty()
    }
}

/// A repository opened on one working copy.
pub struct Repository<W: WorkingTree = FsWorkTree> {
    paths: KitPaths,
    store: ObjectStore,
    refs: RefStore,
    config: Config,
    worktree: W,
}

impl Repository<FsWorkTree> {
    /// Create a new repository in `dir`.
    ///
    /// `HEAD` points at `branch`, or `main` when none is given. The branch
    /// itself is created by the first commit.
    pub fn init(dir: &Path, branch: Option<&str>) -> Result<Self, RepoError> {
        let paths = KitPaths::new(dir.to_path_buf());
        if paths.kit_dir().exists() {
            return Err(RepoError::AlreadyInitialized {
                path: paths.kit_dir(),
            });
        }

        let branch = BranchName::new(branch.unwrap_or(DEFAULT_BRANCH))?;

        let kit_dir = paths.kit_dir();
        fs::create_dir_all(&kit_dir).map_err(|source| RepoError::Io {
            path: kit_dir.clone(),
            source,
        })?;
        let store = ObjectStore::new(paths.objects_dir());
        store.init()?;
        let refs = RefStore::new(paths.clone());
        refs.init()?;
        refs.update_symbolic(&RefName::head(), &RefName::for_branch(&branch))?;

        Config::write_repo(
            &paths,
            &RepoConfig {
                default_branch: Some(branch.to_string()),
                ..RepoConfig::default()
            },
        )?;
        let worktree = FsWorkTree::open(paths.clone())?;
        worktree.save()?;

        tracing::info!(path = %dir.display(), branch = %branch, "initialized repository");
        Self::open_at(paths)
    }

    /// Open the repository containing `start`.
    pub fn discover(start: &Path) -> Result<Self, RepoError> {
        let paths = KitPaths::discover(start).ok_or_else(|| RepoError::NotARepository {
            path: start.to_path_buf(),
        })?;
        Self::open_at(paths)
    }

    fn open_at(paths: KitPaths) -> Result<Self, RepoError> {
        let config = Config::load(Some(&paths.work_dir))?;
        let worktree = FsWorkTree::open(paths.clone())?;
        Ok(Self::with_worktree(paths, config, worktree))
    }
}

impl<W: WorkingTree> Repository<W> {
    /// Assemble a repository from parts. The `.kit` layout must exist.
    pub fn with_worktree(paths: KitPaths, config: Config, worktree: W) -> Self {
        Self {
            store: ObjectStore::new(paths.objects_dir()),
            refs: RefStore::new(paths.clone()),
            paths,
            config,
            worktree,
        }
    }

    pub fn paths(&self) -> &KitPaths {
        &self.paths
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn refs(&self) -> &RefStore {
        &self.refs
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn worktree(&self) -> &W {
        &self.worktree
    }

    fn lock(&self) -> Result<RepoLock, RepoError> {
        Ok(RepoLock::acquire(&self.paths)?)
    }

    /// Convert a filesystem path into a tree path relative to the root.
    ///
    /// Relative paths are taken relative to the working tree root.
    pub fn tree_path(&self, path: &Path) -> Result<String, RepoError> {
        let outside = || RepoError::PathOutsideRepository {
            path: path.to_path_buf(),
        };
        let relative = if path.is_absolute() {
            path.strip_prefix(&self.paths.work_dir).map_err(|_| outside())?
        } else {
            path
        };

        let mut parts: Vec<String> = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                Component::ParentDir => {
                    parts.pop().ok_or_else(outside)?;
                }
                Component::RootDir | Component::Prefix(_) => return Err(outside()),
            }
        }
        if parts.is_empty() || parts[0] == KIT_DIR {
            return Err(outside());
        }
        Ok(parts.join("/"))
    }

    // =========================================================================
    // Staging and commits
    // =========================================================================

    /// Stage the current content of a file.
    pub fn add(&mut self, path: &Path) -> Result<ObjectId, RepoError> {
        let path = self.tree_path(path)?;
        let bytes = self
            .worktree
            .read_file(&path)?
            .ok_or_else(|| RepoError::FileNotFound { path: path.clone() })?;
        let id = self.store.put(&bytes)?;
        self.worktree.stage(&path, id.clone())?;
        tracing::debug!(path, id = %id.short(12), "staged file");
        Ok(id)
    }

    /// Record tracked plus staged entries as a new commit on `HEAD`.
    ///
    /// When a merge is pending, `MERGE_HEAD` becomes the second parent and is
    /// cleared. Paths a halted merge left with markers must be staged first.
    pub fn commit(&mut self, message: &str) -> Result<ObjectId, RepoError> {
        let _lock = self.lock()?;
        let unmerged = self.worktree.unmerged_paths();
        if !unmerged.is_empty() {
            return Err(RepoError::UnmergedPaths {
                paths: unmerged.into_iter().collect(),
            });
        }
        let merge_head = self.refs.merge_head()?;
        let staged = self.worktree.staged_entries();
        if staged.is_empty() && merge_head.is_none() {
            return Err(RepoError::NothingToCommit);
        }

        let mut entries = self.worktree.tracked_entries();
        entries.extend(staged);
        let tree = Tree::from_blobs(entries)?;
        let tree_id = self.store.put_tree(&tree)?;

        let parent = self.refs.try_resolve(&RefName::head())?;
        let commit = Commit {
            tree: tree_id,
            parent2: parent.as_ref().and(merge_head),
            parent,
            author: self.config.author(),
            message: message.to_string(),
            timestamp: UtcTimestamp::now(),
        };
        let id = self.store.put_commit(&commit)?;

        let target = self.refs.head_update_target()?;
        self.refs.update(&target, &id)?;
        self.refs.clear_merge_head()?;
        self.worktree.record_commit(&tree)?;

        tracing::info!(id = %id.short(12), reference = %target, "created commit");
        Ok(id)
    }

    /// Commit `HEAD` resolves to, `None` before the first commit.
    pub fn head_commit(&self) -> Result<Option<ObjectId>, RepoError> {
        Ok(self.refs.try_resolve(&RefName::head())?)
    }

    pub fn current_branch(&self) -> Result<Option<BranchName>, RepoError> {
        Ok(self.refs.current_branch()?)
    }

    /// Resolve `HEAD`, a branch, a tag or a full commit id.
    pub fn resolve_revision(&self, rev: &str) -> Result<ObjectId, RepoError> {
        let unknown = || RepoError::UnknownRevision(rev.to_string());

        if rev == "HEAD" {
            return self.head_commit()?.ok_or(RepoError::NoCommits);
        }
        if let Ok(name) = BranchName::new(rev) {
            for reference in [RefName::for_branch(&name), RefName::for_tag(&name)] {
                if let Some(id) = self.refs.try_resolve(&reference)? {
                    return Ok(id);
                }
            }
        }
        match ObjectId::new(rev) {
            Ok(id) if self.store.contains(&id) => Ok(id),
            _ => Err(unknown()),
        }
    }

    // =========================================================================
    // Branches and tags
    // =========================================================================

    /// All branches, sorted by name.
    pub fn branches(&self) -> Result<Vec<BranchInfo>, RepoError> {
        let current = self.refs.current_branch()?;
        Ok(self
            .refs
            .branches()?
            .into_iter()
            .map(|(name, tip)| BranchInfo {
                current: current.as_ref() == Some(&name),
                name,
                tip,
            })
            .collect())
    }

    /// Create a branch at `HEAD`.
    pub fn create_branch(&self, name: &str) -> Result<ObjectId, RepoError> {
        let _lock = self.lock()?;
        let name = BranchName::new(name)?;
        let reference = RefName::for_branch(&name);
        if self.refs.exists(&reference) {
            return Err(RepoError::BranchExists(name));
        }
        let head = self.head_commit()?.ok_or(RepoError::NoCommits)?;
        self.refs.update(&reference, &head)?;
        tracing::info!(branch = %name, at = %head.short(12), "created branch");
        Ok(head)
    }

    /// All tags, sorted by name.
    pub fn tags(&self) -> Result<Vec<(BranchName, ObjectId)>, RepoError> {
        Ok(self.refs.tags()?)
    }

    /// Create a lightweight tag at `HEAD`.
    pub fn create_tag(&self, name: &str) -> Result<ObjectId, RepoError> {
        let _lock = self.lock()?;
        let name = BranchName::new(name)?;
        let reference = RefName::for_tag(&name);
        if self.refs.exists(&reference) {
            return Err(RepoError::TagExists(name));
        }
        let head = self.head_commit()?.ok_or(RepoError::NoCommits)?;
        self.refs.update(&reference, &head)?;
        Ok(head)
    }

    // =========================================================================
    // Checkout, log, merge
    // =========================================================================

    /// Switch to a branch, or detach `HEAD` at a commit.
    pub fn checkout(&mut self, target: &str) -> Result<CheckoutTarget, RepoError> {
        let _lock = self.lock()?;
        let staged = self.worktree.staged_entries();
        if !staged.is_empty() {
            return Err(RepoError::DirtyWorkingState {
                staged: staged.into_keys().collect(),
            });
        }
        if self.refs.merge_head()?.is_some() {
            return Err(RepoError::MergeInProgress);
        }

        let branch = BranchName::new(target)
            .ok()
            .filter(|b| self.refs.exists(&RefName::for_branch(b)));
        let (id, outcome) = match branch {
            Some(branch) => {
                let reference = RefName::for_branch(&branch);
                let id = self.refs.resolve(&reference)?;
                self.refs.update_symbolic(&RefName::head(), &reference)?;
                (id, CheckoutTarget::Branch(branch))
            }
            None => {
                let id = self.resolve_revision(target)?;
                self.store.get_commit(&id)?;
                self.refs.update(&RefName::head(), &id)?;
                (id.clone(), CheckoutTarget::Detached(id))
            }
        };

        let tree = self.store.tree_of_commit(&id)?;
        self.worktree.materialize(&self.store, &tree)?;
        tracing::info!(rev = target, id = %id.short(12), "checked out");
        Ok(outcome)
    }

    /// First-parent history from `HEAD`, newest first.
    pub fn log(&self, limit: Option<usize>) -> Result<Vec<LogEntry>, RepoError> {
        let Some(head) = self.head_commit()? else {
            return Ok(Vec::new());
        };
        first_parent_history(&self.store, &head, limit)?
            .into_iter()
            .map(|id| {
                let commit = self.store.get_commit(&id)?;
                Ok(LogEntry { id, commit })
            })
            .collect()
    }

    /// Merge branch `theirs` into the current branch.
    pub fn merge(&mut self, theirs: &str, options: &MergeOptions) -> Result<MergeOutcome, RepoError> {
        let _lock = self.lock()?;
        let theirs = BranchName::new(theirs)?;
        let author = self.config.author();
        let oracle = TokenOracle::default();

        let outcome = MergeEngine::new(&self.store, &self.refs)
            .with_oracle(&oracle)
            .merge(&mut self.worktree, &theirs, options, &author)?;

        tracing::info!(
            theirs = %theirs,
            status = ?outcome.status,
            conflicts = outcome.conflicts.len(),
            "merge finished"
        );
        Ok(outcome)
    }

    // =========================================================================
    // Diff entry points
    // =========================================================================

    /// Diff two revisions.
    pub fn diff_revisions(&self, old: &str, new: &str, context: usize) -> Result<Vec<FileDiff>, RepoError> {
        let old_tree = self.store.tree_of_commit(&self.resolve_revision(old)?)?;
        let new_tree = self.store.tree_of_commit(&self.resolve_revision(new)?)?;
        Ok(content_diffs(&self.store, &old_tree, &new_tree, context)?)
    }

    /// Diff a revision against the working files it or the index knows about.
    pub fn diff_worktree(&self, rev: &str, context: usize) -> Result<Vec<FileDiff>, RepoError> {
        let tree = match self.resolve_revision(rev) {
            Ok(id) => self.store.tree_of_commit(&id)?,
            Err(RepoError::NoCommits) => Tree::new(),
            Err(e) => return Err(e),
        };

        let paths: BTreeSet<String> = tree
            .paths()
            .cloned()
            .chain(self.worktree.tracked_entries().into_keys())
            .chain(self.worktree.staged_entries().into_keys())
            .collect();

        let mut diffs = Vec::new();
        for path in paths {
            let diff = self.diff_entry(&tree, &path, context)?;
            if !diff.is_empty() {
                diffs.push(diff);
            }
        }
        Ok(diffs)
    }

    /// Diff one path of a revision against its working file.
    pub fn diff_path(&self, rev: &str, path: &Path, context: usize) -> Result<FileDiff, RepoError> {
        let tree = self.store.tree_of_commit(&self.resolve_revision(rev)?)?;
        let path = self.tree_path(path)?;
        self.diff_entry(&tree, &path, context)
    }

    fn diff_entry(&self, tree: &Tree, path: &str, context: usize) -> Result<FileDiff, RepoError> {
        let old = match tree.get(path) {
            Some(entry) => Some(self.store.get(&entry.id)?),
            None => None,
        };
        let new = self.worktree.read_file(path)?;
        Ok(FileDiff::between(
            old.as_ref().map(|_| path),
            new.as_ref().map(|_| path),
            old.as_deref().unwrap_or_default(),
            new.as_deref().unwrap_or_default(),
            context,
        ))
    }

    // =========================================================================
    // Verification
    // =========================================================================

    /// Re-hash every object and check that every reference reaches a commit.
    pub fn verify(&self) -> Result<VerifyReport, RepoError> {
        let objects = self.store.verify()?;

        let mut targets: Vec<(String, ObjectId)> = Vec::new();
        for (name, id) in self.refs.branches()? {
            targets.push((RefName::for_branch(&name).to_string(), id));
        }
        for (name, id) in self.refs.tags()? {
            targets.push((RefName::for_tag(&name).to_string(), id));
        }
        if let RefTarget::Direct(id) = self.refs.head()? {
            targets.push((RefName::head().to_string(), id));
        }
        if let Some(id) = self.refs.merge_head()? {
            targets.push((RefName::merge_head().to_string(), id));
        }

        let dangling = targets
            .into_iter()
            .filter(|(_, id)| self.store.get_commit(id).is_err())
            .collect::<Vec<_>>();
        for (name, id) in &dangling {
            tracing::warn!(reference = %name, id = %id.short(12), "reference target is not a commit");
        }

        Ok(VerifyReport { objects, dangling })
    }
}

/// Diff two files outside the object store.
///
/// `old` and `new` are resolved against `dir` and labeled as given.
pub fn diff_files(dir: &Path, old: &str, new: &str, context: usize) -> Result<FileDiff, RepoError> {
    let read = |name: &str| {
        let path = dir.join(name);
        fs::read(&path).map_err(|source| RepoError::Io { path, source })
    };
    let (before, after) = (read(old)?, read(new)?);
    Ok(FileDiff::between(Some(old), Some(new), &before, &after, context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::engine::MergeStatus;
    use crate::merge::strategy::MergeStrategy;
    use tempfile::TempDir;

    fn init() -> (TempDir, Repository) {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path(), None).unwrap();
        (temp, repo)
    }

    fn write(temp: &TempDir, path: &str, content: &str) {
        let full = temp.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    fn commit_file(repo: &mut Repository, temp: &TempDir, path: &str, content: &str) -> ObjectId {
        write(temp, path, content);
        repo.add(Path::new(path)).unwrap();
        repo.commit(&format!("update {path}")).unwrap()
    }

    mod init {
        use super::*;

        #[test]
        fn creates_layout_and_symbolic_head() {
            let (temp, repo) = init();
            let kit = temp.path().join(".kit");
            assert!(kit.join("objects").is_dir());
            assert!(kit.join("refs/heads").is_dir());
            assert!(kit.join("refs/tags").is_dir());
            assert_eq!(
                fs::read_to_string(kit.join("HEAD")).unwrap(),
                "ref: refs/heads/main\n"
            );
            assert!(repo.head_commit().unwrap().is_none());
        }

        #[test]
        fn custom_branch() {
            let temp = TempDir::new().unwrap();
            Repository::init(temp.path(), Some("trunk")).unwrap();
            assert_eq!(
                fs::read_to_string(temp.path().join(".kit/HEAD")).unwrap(),
                "ref: refs/heads/trunk\n"
            );
        }

        #[test]
        fn reinit_fails() {
            let (temp, _repo) = init();
            assert!(matches!(
                Repository::init(temp.path(), None),
                Err(RepoError::AlreadyInitialized { .. })
            ));
        }

        #[test]
        fn discover_from_subdirectory() {
            let (temp, _repo) = init();
            fs::create_dir_all(temp.path().join("a/b")).unwrap();
            let repo = Repository::discover(&temp.path().join("a/b")).unwrap();
            assert_eq!(repo.paths().work_dir, temp.path());
        }

        #[test]
        fn discover_outside_fails() {
            let temp = TempDir::new().unwrap();
            assert!(matches!(
                Repository::discover(temp.path()),
                Err(RepoError::NotARepository { .. })
            ));
        }
    }

    mod commits {
        use super::*;

        #[test]
        fn root_commit_then_child() {
            let (temp, mut repo) = init();
            let c1 = commit_file(&mut repo, &temp, "a.txt", "1\n");
            let c2 = commit_file(&mut repo, &temp, "b.txt", "2\n");

            let root = repo.store().get_commit(&c1).unwrap();
            assert_eq!(root.parent, None);
            let child = repo.store().get_commit(&c2).unwrap();
            assert_eq!(child.parent, Some(c1));

            let tree = repo.store().get_tree(&child.tree).unwrap();
            let paths: Vec<_> = tree.paths().cloned().collect();
            assert_eq!(paths, vec!["a.txt", "b.txt"]);
            assert!(!repo.worktree().has_staged());
        }

        #[test]
        fn empty_stage_is_nothing_to_commit() {
            let (_temp, mut repo) = init();
            assert!(matches!(repo.commit("empty"), Err(RepoError::NothingToCommit)));
        }

        #[test]
        fn add_missing_file_fails() {
            let (_temp, mut repo) = init();
            assert!(matches!(
                repo.add(Path::new("ghost.txt")),
                Err(RepoError::FileNotFound { .. })
            ));
        }

        #[test]
        fn paths_are_normalized() {
            let (temp, repo) = init();
            assert_eq!(repo.tree_path(Path::new("./a/../b/c.txt")).unwrap(), "b/c.txt");
            assert_eq!(repo.tree_path(&temp.path().join("x/y")).unwrap(), "x/y");
            assert!(repo.tree_path(Path::new("../escape")).is_err());
            assert!(repo.tree_path(Path::new(".kit/HEAD")).is_err());
        }

        #[test]
        fn log_follows_first_parent() {
            let (temp, mut repo) = init();
            let c1 = commit_file(&mut repo, &temp, "a", "1\n");
            let c2 = commit_file(&mut repo, &temp, "a", "2\n");
            let ids: Vec<_> = repo.log(None).unwrap().into_iter().map(|e| e.id).collect();
            assert_eq!(ids, vec![c2.clone(), c1]);
            assert_eq!(repo.log(Some(1)).unwrap()[0].id, c2);
        }
    }

    mod refs {
        use super::*;

        #[test]
        fn branch_requires_a_commit() {
            let (_temp, repo) = init();
            assert!(matches!(repo.create_branch("topic"), Err(RepoError::NoCommits)));
        }

        #[test]
        fn branch_and_tag_creation() {
            let (temp, mut repo) = init();
            let c1 = commit_file(&mut repo, &temp, "a", "1\n");
            repo.create_branch("topic").unwrap();
            assert!(matches!(repo.create_branch("topic"), Err(RepoError::BranchExists(_))));

            let branches = repo.branches().unwrap();
            let names: Vec<_> = branches.iter().map(|b| b.name.as_str()).collect();
            assert_eq!(names, vec!["main", "topic"]);
            assert!(branches[0].current);

            repo.create_tag("v1").unwrap();
            assert_eq!(repo.resolve_revision("v1").unwrap(), c1);
            assert!(matches!(repo.create_tag("v1"), Err(RepoError::TagExists(_))));
        }

        #[test]
        fn resolve_revision_forms() {
            let (temp, mut repo) = init();
            let c1 = commit_file(&mut repo, &temp, "a", "1\n");
            assert_eq!(repo.resolve_revision("HEAD").unwrap(), c1);
            assert_eq!(repo.resolve_revision("main").unwrap(), c1);
            assert_eq!(repo.resolve_revision(c1.as_str()).unwrap(), c1);
            assert!(matches!(
                repo.resolve_revision("nope"),
                Err(RepoError::UnknownRevision(_))
            ));
        }
    }

    mod checkout {
        use super::*;

        #[test]
        fn switches_files_and_head() {
            let (temp, mut repo) = init();
            commit_file(&mut repo, &temp, "a", "1\n");
            repo.create_branch("topic").unwrap();
            commit_file(&mut repo, &temp, "b", "only on main\n");

            let target = repo.checkout("topic").unwrap();
            assert_eq!(target, CheckoutTarget::Branch(BranchName::new("topic").unwrap()));
            assert!(!temp.path().join("b").exists());
            assert_eq!(
                repo.current_branch().unwrap().unwrap().as_str(),
                "topic"
            );

            repo.checkout("main").unwrap();
            assert!(temp.path().join("b").exists());
        }

        #[test]
        fn commit_id_detaches_head() {
            let (temp, mut repo) = init();
            let c1 = commit_file(&mut repo, &temp, "a", "1\n");
            commit_file(&mut repo, &temp, "a", "2\n");

            let target = repo.checkout(c1.as_str()).unwrap();
            assert_eq!(target, CheckoutTarget::Detached(c1.clone()));
            assert!(repo.current_branch().unwrap().is_none());
            assert_eq!(fs::read_to_string(temp.path().join("a")).unwrap(), "1\n");
        }

        #[test]
        fn staged_changes_block_checkout() {
            let (temp, mut repo) = init();
            commit_file(&mut repo, &temp, "a", "1\n");
            repo.create_branch("topic").unwrap();
            write(&temp, "a", "dirty\n");
            repo.add(Path::new("a")).unwrap();
            assert!(matches!(
                repo.checkout("topic"),
                Err(RepoError::DirtyWorkingState { .. })
            ));
        }
    }

    mod merging {
        use super::*;

        #[test]
        fn halted_merge_concludes_with_two_parents() {
            let (temp, mut repo) = init();
            commit_file(&mut repo, &temp, "f", "x\n");
            repo.create_branch("feature").unwrap();
            let ours = commit_file(&mut repo, &temp, "f", "y\n");
            repo.checkout("feature").unwrap();
            let theirs = commit_file(&mut repo, &temp, "f", "z\n");
            repo.checkout("main").unwrap();

            let outcome = repo
                .merge("feature", &MergeOptions::with_strategy(MergeStrategy::Manual))
                .unwrap();
            assert_eq!(outcome.status, MergeStatus::Conflicted);
            assert!(fs::read_to_string(temp.path().join("f"))
                .unwrap()
                .contains("======="));

            let merged = commit_file(&mut repo, &temp, "f", "resolved\n");
            let commit = repo.store().get_commit(&merged).unwrap();
            assert_eq!(commit.parent, Some(ours));
            assert_eq!(commit.parent2, Some(theirs));
            assert!(repo.refs().merge_head().unwrap().is_none());
        }

        #[test]
        fn commit_waits_until_conflicts_are_restaged() {
            let (temp, mut repo) = init();
            commit_file(&mut repo, &temp, "f", "x\n");
            commit_file(&mut repo, &temp, "g", "x\n");
            repo.create_branch("feature").unwrap();
            write(&temp, "f", "y\n");
            write(&temp, "g", "y\n");
            repo.add(Path::new("f")).unwrap();
            repo.add(Path::new("g")).unwrap();
            repo.commit("ours").unwrap();
            repo.checkout("feature").unwrap();
            write(&temp, "f", "z\n");
            write(&temp, "g", "z\n");
            repo.add(Path::new("f")).unwrap();
            repo.add(Path::new("g")).unwrap();
            repo.commit("theirs").unwrap();
            repo.checkout("main").unwrap();
            let before = repo.head_commit().unwrap();

            repo.merge("feature", &MergeOptions::with_strategy(MergeStrategy::Manual))
                .unwrap();
            match repo.commit("too early") {
                Err(RepoError::UnmergedPaths { paths }) => assert_eq!(paths, vec!["f", "g"]),
                other => panic!("unexpected result: {other:?}"),
            }

            write(&temp, "f", "resolved\n");
            repo.add(Path::new("f")).unwrap();
            match repo.commit("still early") {
                Err(RepoError::UnmergedPaths { paths }) => assert_eq!(paths, vec!["g"]),
                other => panic!("unexpected result: {other:?}"),
            }
            assert_eq!(repo.head_commit().unwrap(), before);

            write(&temp, "g", "resolved\n");
            repo.add(Path::new("g")).unwrap();
            let merged = repo.commit("merge").unwrap();
            let theirs = repo.resolve_revision("feature").unwrap();
            assert_eq!(repo.store().get_commit(&merged).unwrap().parent2, Some(theirs));
        }

        #[test]
        fn no_commit_merge_can_conclude_without_new_stages() {
            let (temp, mut repo) = init();
            commit_file(&mut repo, &temp, "a", "a\n");
            repo.create_branch("feature").unwrap();
            commit_file(&mut repo, &temp, "b", "b\n");
            repo.checkout("feature").unwrap();
            commit_file(&mut repo, &temp, "c", "c\n");
            repo.checkout("main").unwrap();

            let options = MergeOptions {
                no_commit: true,
                ..MergeOptions::default()
            };
            repo.merge("feature", &options).unwrap();
            let merged = repo.commit("merge").unwrap();
            assert!(repo.store().get_commit(&merged).unwrap().parent2.is_some());
        }
    }

    mod diffing {
        use super::*;

        #[test]
        fn worktree_diff_shows_edits() {
            let (temp, mut repo) = init();
            commit_file(&mut repo, &temp, "a", "1\n2\n");
            write(&temp, "a", "1\nTWO\n");

            let diffs = repo.diff_worktree("HEAD", 3).unwrap();
            assert_eq!(diffs.len(), 1);
            assert_eq!(diffs[0].hunks[0].added(), 1);
            assert_eq!(diffs[0].hunks[0].removed(), 1);
        }

        #[test]
        fn revision_diff_reports_added_file() {
            let (temp, mut repo) = init();
            let c1 = commit_file(&mut repo, &temp, "a", "1\n");
            let c2 = commit_file(&mut repo, &temp, "b", "new\n");
            let diffs = repo.diff_revisions(c1.as_str(), c2.as_str(), 3).unwrap();
            assert_eq!(diffs.len(), 1);
            assert_eq!(diffs[0].old_path, None);
            assert_eq!(diffs[0].new_path.as_deref(), Some("b"));
        }

        #[test]
        fn same_revision_has_no_diff() {
            let (temp, mut repo) = init();
            commit_file(&mut repo, &temp, "a", "1\n");
            assert!(repo.diff_revisions("HEAD", "main", 3).unwrap().is_empty());
        }

        #[test]
        fn two_files() {
            let temp = TempDir::new().unwrap();
            write(&temp, "old", "a\n");
            write(&temp, "new", "b\n");
            let diff = diff_files(temp.path(), "old", "new", 3).unwrap();
            assert_eq!(diff.hunks.len(), 1);
            assert_eq!(diff.old_path.as_deref(), Some("old"));
        }
    }

    mod verification {
        use super::*;

        #[test]
        fn clean_repository_verifies() {
            let (temp, mut repo) = init();
            commit_file(&mut repo, &temp, "a", "1\n");
            assert!(repo.verify().unwrap().is_clean());
        }

        #[test]
        fn dangling_branch_is_reported() {
            let (temp, mut repo) = init();
            commit_file(&mut repo, &temp, "a", "1\n");
            let missing = ObjectId::hash_bytes(b"missing");
            fs::write(
                temp.path().join(".kit/refs/heads/broken"),
                format!("{missing}\n"),
            )
            .unwrap();

            let report = repo.verify().unwrap();
            assert!(!report.is_clean());
            assert_eq!(
                report.dangling,
                vec![("refs/heads/broken".to_string(), missing)]
            );
        }
    }
}
