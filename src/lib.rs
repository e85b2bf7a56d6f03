//! Kit - content-addressed version control with a three-way merge engine
//!
//! Kit stores every file, directory snapshot and commit as an immutable,
//! SHA-256 addressed object, tracks branches as small reference files, and
//! reconciles divergent histories with a three-way tree and file merge.
//!
//! # Architecture
//!
//! The codebase is layered:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to [`repo`])
//! - [`repo`] - Repository handle owning stores, config and working tree
//! - [`merge`] - Merge strategies, file and tree merge, merge orchestration
//! - [`diff`] - LCS line diff, hunks, tree diff and unified rendering
//! - [`store`] - Object store and reference store
//! - [`worktree`] - Working tree and index collaborator
//! - [`similarity`] - Similarity oracle for semantic-assisted merges
//! - [`core`] - Domain types, object model, commit graph, config, paths, locking
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! 1. An object's id is the hash of its canonical bytes; objects never change
//! 2. A commit is written only after its whole tree is stored
//! 3. Merge conflicts are results, never errors
//! 4. Reference moves are serialized by the repository lock

pub mod cli;
pub mod core;
pub mod diff;
pub mod merge;
pub mod repo;
pub mod similarity;
pub mod store;
pub mod ui;
pub mod worktree;
