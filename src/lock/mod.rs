//! Advisory per-table locking
//!
//! A table is locked by exclusively creating `<table>.lock` beside it. Waiters
//! retry with exponential backoff; artifacts whose owner died or that exceed
//! the staleness threshold are reclaimed. Locks held at SIGINT/SIGTERM are
//! removed before the process exits.
//!
//! The lock is advisory: only processes going through this crate respect it.

pub mod artifact;
mod backoff;
pub mod lifecycle;
mod manager;

pub use artifact::{artifact_path, LockOwner, StaleReason};
pub use backoff::RetryPolicy;
pub use manager::{LockGuard, LockManager};
