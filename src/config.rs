//! Table configuration
//!
//! Loaded from a JSON file by the CLI, or built in code. Every field is
//! optional in the file:
//!
//! ```json
//! {
//!   "delimiter": ";",
//!   "temp_dir": "/var/tmp/csvdb",
//!   "lock": { "retries": 500, "factor": 3.0, "min_timeout_ms": 10 }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{DbError, DbResult};

/// Default field delimiter
pub const DEFAULT_DELIMITER: char = ';';

/// Per-table settings shared by the codec, rewrite pipeline and lock manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Field delimiter, fixed for the lifetime of a table handle
    pub delimiter: char,

    /// Scratch directory for replacement files (system temp dir when unset)
    pub temp_dir: Option<PathBuf>,

    /// Lock acquisition policy
    pub lock: LockOptions,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            temp_dir: None,
            lock: LockOptions::default(),
        }
    }
}

impl TableConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> DbResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DbError::config_error(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let config: TableConfig = serde_json::from_str(&content)
            .map_err(|e| DbError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Returns a copy using another delimiter
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Returns a copy writing replacement files under `dir`
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Returns a copy using another lock policy
    pub fn with_lock(mut self, lock: LockOptions) -> Self {
        self.lock = lock;
        self
    }

    /// Scratch directory for replacement files
    pub fn scratch_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Validate the configuration
    pub fn validate(&self) -> DbResult<()> {
        if matches!(self.delimiter, '"' | '\n' | '\r') {
            return Err(DbError::config_error(format!(
                "Invalid delimiter {:?}: quotes and line breaks are reserved",
                self.delimiter
            )));
        }
        self.lock.validate()
    }
}

/// Retry and staleness policy for the advisory lock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockOptions {
    /// Retries after the first failed attempt
    pub retries: u32,
    /// Backoff multiplier per attempt
    pub factor: f64,
    /// First retry delay
    pub min_timeout_ms: u64,
    /// Ceiling for any single retry delay
    pub max_timeout_ms: u64,
    /// Multiply each delay by a random factor in [1, 2)
    pub randomize: bool,
    /// Time without a heartbeat after which a lock artifact is reclaimed even
    /// if its owner looks alive. Holders refresh their artifact every half of it.
    pub stale_after_ms: u64,
    /// Release held locks and exit on SIGINT/SIGTERM
    pub release_on_signal: bool,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            retries: 500,
            factor: 3.0,
            min_timeout_ms: 10,
            max_timeout_ms: 60_000,
            randomize: true,
            stale_after_ms: 600_000,
            release_on_signal: true,
        }
    }
}

impl LockOptions {
    /// Policy with short waits, for tests and interactive tools
    pub fn fast() -> Self {
        Self {
            retries: 200,
            factor: 1.5,
            min_timeout_ms: 1,
            max_timeout_ms: 25,
            randomize: true,
            stale_after_ms: 600_000,
            release_on_signal: false,
        }
    }

    /// First retry delay
    pub fn min_timeout(&self) -> Duration {
        Duration::from_millis(self.min_timeout_ms)
    }

    /// Ceiling for a retry delay
    pub fn max_timeout(&self) -> Duration {
        Duration::from_millis(self.max_timeout_ms)
    }

    /// Staleness threshold
    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }

    fn validate(&self) -> DbResult<()> {
        if !self.factor.is_finite() || self.factor < 1.0 {
            return Err(DbError::config_error(format!(
                "lock.factor must be >= 1, got {}",
                self.factor
            )));
        }
        if self.min_timeout_ms > self.max_timeout_ms {
            return Err(DbError::config_error(
                "lock.min_timeout_ms must not exceed lock.max_timeout_ms",
            ));
        }
        if self.stale_after_ms == 0 {
            return Err(DbError::config_error("lock.stale_after_ms must be > 0"));
        }
        Ok(())
    }
}
