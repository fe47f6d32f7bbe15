//! CLI argument definitions using clap
//!
//! Commands:
//! - csvdb init --file <path> --fields name,age
//! - csvdb get --file <path> [--where k=v]...
//! - csvdb add --file <path> --set k=v...
//! - csvdb edit --file <path> [--where k=v]... --set k=v...
//! - csvdb delete --file <path> (--where k=v... | --all)

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// csvdb - a flat-file CSV database
#[derive(Parser, Debug)]
#[command(name = "csvdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Field delimiter, overriding the configuration
    #[arg(long, global = true)]
    pub delimiter: Option<char>,

    #[command(subcommand)]
    pub command: Command,
}

/// The table file every command operates on
#[derive(Args, Debug, Clone)]
pub struct TableArg {
    /// Path to the table file
    #[arg(long)]
    pub file: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a table, or check an existing table's header
    Init {
        #[command(flatten)]
        table: TableArg,

        /// Comma-separated field names
        #[arg(long, value_delimiter = ',', required = true)]
        fields: Vec<String>,
    },

    /// Print rows, optionally filtered
    Get {
        #[command(flatten)]
        table: TableArg,

        /// Only rows where field equals value
        #[arg(long = "where", value_name = "FIELD=VALUE", value_parser = parse_pair)]
        filter: Vec<(String, String)>,
    },

    /// Append one row
    Add {
        #[command(flatten)]
        table: TableArg,

        /// Field value of the new row
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_pair, required = true)]
        values: Vec<(String, String)>,
    },

    /// Update matching rows
    Edit {
        #[command(flatten)]
        table: TableArg,

        /// Only rows where field equals value
        #[arg(long = "where", value_name = "FIELD=VALUE", value_parser = parse_pair)]
        filter: Vec<(String, String)>,

        /// Field value to write into every matching row
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_pair, required = true)]
        values: Vec<(String, String)>,
    },

    /// Remove matching rows
    Delete {
        #[command(flatten)]
        table: TableArg,

        /// Only rows where field equals value
        #[arg(long = "where", value_name = "FIELD=VALUE", value_parser = parse_pair)]
        filter: Vec<(String, String)>,

        /// Remove every row when no --where is given
        #[arg(long, conflicts_with = "filter")]
        all: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Parses `field=value`. The value may be empty or contain `=`.
pub fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, _)) if field.is_empty() => Err(format!("missing field name in '{}'", raw)),
        Some((field, value)) => Ok((field.to_string(), value.to_string())),
        None => Err(format!("expected FIELD=VALUE, got '{}'", raw)),
    }
}
