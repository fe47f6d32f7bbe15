//! CLI module for csvdb
//!
//! Provides command-line access to one table per invocation:
//! - init: Create a table or check its header
//! - get / add / edit / delete: CRUD verbs, result printed as JSON

mod args;
mod commands;
mod errors;
mod io;

pub use args::{parse_pair, Cli, Command, TableArg};
pub use commands::{init, load_config, run, run_command};
pub use errors::{CliError, CliResult};
pub use io::write_rows;
