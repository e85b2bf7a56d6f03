//! store
//!
//! Persistent repository storage.
//!
//! - [`objects`] - Content-addressed object database
//! - [`refs`] - Branch, tag and pseudo-ref pointers

pub mod objects;
pub mod refs;

pub use objects::{ObjectStore, StoreError, StoreReport};
pub use refs::{RefError, RefStore, RefTarget};
