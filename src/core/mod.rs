//! core
//!
//! Core domain types, object model and repository plumbing for Kit.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ObjectId, BranchName, RefName, UtcTimestamp
//! - [`object`] - Blob, tree and commit model with canonical encoding
//! - [`graph`] - Commit graph traversal and merge-base
//! - [`paths`] - Centralized path routing for `.kit` storage
//! - [`config`] - Configuration schema and loading
//! - [`ops`] - Repository locking
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Encodings are canonical and self-describing
//! - Traversals are iterative and deterministic

pub mod config;
pub mod graph;
pub mod object;
pub mod ops;
pub mod paths;
pub mod types;
