//! CLI command implementations
//!
//! Each command opens the table, runs one verb and prints its result.

use std::path::Path;

use crate::codec::Record;
use crate::config::TableConfig;
use crate::table::Table;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::write_rows;

/// Parse arguments and run the selected command
pub async fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli).await
}

/// Run the appropriate command based on CLI args
pub async fn run_command(cli: Cli) -> CliResult<()> {
    let config = load_config(cli.config.as_deref(), cli.delimiter)?;

    match cli.command {
        Command::Init { table, fields } => init(&table.file, fields, config).await,
        Command::Get { table, filter } => {
            let table = Table::attach(&table.file, config).await?;
            let filter = (!filter.is_empty()).then(|| Record::from_pairs(filter));
            write_rows(&table.get(filter.as_ref()).await?)
        }
        Command::Add { table, values } => {
            let table = Table::attach(&table.file, config).await?;
            write_rows(&table.add(vec![Record::from_pairs(values)]).await?)
        }
        Command::Edit {
            table,
            filter,
            values,
        } => {
            let table = Table::attach(&table.file, config).await?;
            let updated = table
                .edit(&Record::from_pairs(filter), &Record::from_pairs(values))
                .await?;
            write_rows(&updated)
        }
        Command::Delete { table, filter, all } => {
            if filter.is_empty() && !all {
                return Err(CliError::InvalidArgument(
                    "delete needs --where FIELD=VALUE or --all".to_string(),
                ));
            }
            let table = Table::attach(&table.file, config).await?;
            write_rows(&table.delete(&Record::from_pairs(filter)).await?)
        }
    }
}

/// Create the table if needed and print its header
pub async fn init(file: &Path, fields: Vec<String>, config: TableConfig) -> CliResult<()> {
    let table = Table::open(file, fields, config).await?;
    write_rows(table.header().fields())
}

/// Configuration from `--config` (defaults otherwise), with `--delimiter` applied
pub fn load_config(path: Option<&Path>, delimiter: Option<char>) -> CliResult<TableConfig> {
    let mut config = match path {
        Some(path) => TableConfig::load(path)?,
        None => TableConfig::default(),
    };
    if let Some(delimiter) = delimiter {
        config = config.with_delimiter(delimiter);
    }
    config.validate()?;
    Ok(config)
}
