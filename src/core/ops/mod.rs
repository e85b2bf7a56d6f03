//! core::ops
//!
//! Operation guards for mutating repository commands.
//!
//! - [`lock`] - Exclusive repository lock

pub mod lock;

pub use lock::{LockError, RepoLock};
