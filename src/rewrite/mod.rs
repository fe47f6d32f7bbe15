//! Atomic rewrite pipeline
//!
//! Replaces a table's entire content in one logical operation: decode the
//! current file, transform, encode into a fresh replacement file, seal it,
//! copy it over the target.
//!
//! # Guarantees
//!
//! - The target is never written before the replacement is fully on disk
//! - Errors before copy-back leave the target byte-for-byte unchanged
//! - Copy-back failures surface as `CSVDB_PARTIAL_WRITE`
//! - The replacement file never outlives the operation, except on crash
//!
//! Callers must hold the table's lock; the pipeline itself does no locking.

mod pipeline;
mod temp;

pub use pipeline::{append, copy_back, edit, RewriteOptions, RewriteOutcome};
pub use temp::TempReplacement;
