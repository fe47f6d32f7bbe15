//! CLI-specific error types

use thiserror::Error;

use crate::errors::DbError;

/// Result type for CLI commands
pub type CliResult<T> = Result<T, CliError>;

/// CLI errors
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::InvalidArgument(_) => "CSVDB_CLI_INVALID_ARGUMENT",
            CliError::Db(e) => e.code().code(),
            CliError::Output(_) | CliError::Json(_) => "CSVDB_CLI_OUTPUT_ERROR",
        }
    }
}
