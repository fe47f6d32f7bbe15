//! Error types for csvdb
//!
//! Error codes:
//! - CSVDB_IO_ERROR (ERROR severity)
//! - CSVDB_FORMAT_ERROR (ERROR severity)
//! - CSVDB_LOCK_TIMEOUT (ERROR severity)
//! - CSVDB_PARTIAL_WRITE (FATAL severity) - table content can no longer be trusted
//! - CSVDB_CONFIG_INVALID (ERROR severity)
//!
//! No error is retried above the lock layer. A rejected mutating call leaves
//! the table in an unknown state unless the caller verifies its content.

use std::fmt;
use std::io;

/// Severity levels for csvdb errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, table content is unaffected or unknown
    Error,
    /// Table file may be partially overwritten
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorCode {
    /// File open/read/write failure
    IoError,
    /// Header/row mismatch or malformed delimited text
    FormatError,
    /// Lock retry budget exhausted
    LockTimeout,
    /// Copy-back failed after the target was truncated
    PartialWrite,
    /// Invalid configuration
    ConfigError,
}

impl DbErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            DbErrorCode::IoError => "CSVDB_IO_ERROR",
            DbErrorCode::FormatError => "CSVDB_FORMAT_ERROR",
            DbErrorCode::LockTimeout => "CSVDB_LOCK_TIMEOUT",
            DbErrorCode::PartialWrite => "CSVDB_PARTIAL_WRITE",
            DbErrorCode::ConfigError => "CSVDB_CONFIG_INVALID",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            DbErrorCode::PartialWrite => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for DbErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// csvdb error with full context
#[derive(Debug)]
pub struct DbError {
    /// Error code
    code: DbErrorCode,
    /// Human-readable message
    message: String,
    /// Optional details about the error context
    details: Option<String>,
    /// Underlying IO error if applicable
    source: Option<io::Error>,
}

impl DbError {
    /// Create an I/O error
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: DbErrorCode::IoError,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create a format error
    pub fn format_error(message: impl Into<String>) -> Self {
        Self {
            code: DbErrorCode::FormatError,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create a format error pointing at a physical line of a file
    pub fn format_error_at_line(line: usize, reason: impl Into<String>) -> Self {
        Self {
            code: DbErrorCode::FormatError,
            message: reason.into(),
            details: Some(format!("line: {}", line)),
            source: None,
        }
    }

    /// Create a lock timeout error
    pub fn lock_timeout(artifact: impl Into<String>, attempts: u32) -> Self {
        Self {
            code: DbErrorCode::LockTimeout,
            message: format!("Lock still held after {} attempts", attempts),
            details: Some(format!("lock_artifact: {}", artifact.into())),
            source: None,
        }
    }

    /// Create a partial write error (FATAL)
    pub fn partial_write(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: DbErrorCode::PartialWrite,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self {
            code: DbErrorCode::ConfigError,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Attach details to an existing error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Returns the error code
    pub fn code(&self) -> DbErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether the table file may have been partially overwritten
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        if let Some(ref source) = self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for DbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for csvdb operations
pub type DbResult<T> = Result<T, DbError>;
