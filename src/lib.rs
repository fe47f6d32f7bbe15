//! csvdb - an embedded flat-file CSV database
//!
//! Each table is one delimited file with a header line. Reads stream the file
//! directly; every mutation rewrites the whole file under an advisory lock:
//!
//! 1. Acquire `<file>.lock` (exclusive create, backoff with jitter, stale reclaim)
//! 2. Stream records through a transform into a scratch file
//! 3. Seal the scratch file (flush + fsync)
//! 4. Copy it over the table
//! 5. Release the lock
//!
//! # Modules
//!
//! - `codec`: record types, CSV field encoding, async reader and writer
//! - `rewrite`: the decode-transform-encode-copy pipeline
//! - `lock`: lock artifacts, backoff, signal-time release
//! - `editor`: binds a path to its lock manager and rewrite options
//! - `table`: CRUD verbs and table initialization
//! - `cli`: the `csvdb` command line

pub mod cli;
pub mod codec;
pub mod config;
pub mod crash_point;
pub mod editor;
pub mod errors;
pub mod lock;
pub mod observability;
pub mod rewrite;
pub mod table;

pub use codec::{Header, Record};
pub use config::{LockOptions, TableConfig};
pub use editor::Editor;
pub use errors::{DbError, DbErrorCode, DbResult};
pub use table::Table;
