//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Verbosity-aware printing and formatting helpers
//!
//! # Design
//!
//! Command results go to stdout through this module so `--quiet` is honored
//! in one place. Diagnostics go through `tracing` to stderr.

pub mod output;
