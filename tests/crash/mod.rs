//! Crash testing framework
//!
//! - Subprocess management with crash injection
//! - Table fixtures and post-crash inspection

pub mod harness;
pub mod scenarios;
pub mod utils;

pub use harness::*;
pub use utils::*;
