//! Observable events for csvdb
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Table lifecycle
    /// Table file created with its header
    TableCreated,
    /// Existing table opened
    TableOpened,

    // Lock manager
    /// Lock artifact created
    LockAcquired,
    /// Lock artifact already present, waiting
    LockContended,
    /// Stale lock artifact removed
    LockReclaimed,
    /// Lock artifact removed by its owner
    LockReleased,
    /// Retry budget exhausted
    LockTimeout,

    // Process lifecycle
    /// Termination signal received, held locks being released
    SignalReceived,

    // Rewrite pipeline
    /// Temp file fully written and flushed
    TempFileSealed,
    /// Copy-back over the target failed after truncation
    CopyBackFailed,
    /// Replacement file could not be removed after a completed rewrite
    TempFileCleanupFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::TableCreated => "TABLE_CREATED",
            Event::TableOpened => "TABLE_OPENED",

            Event::LockAcquired => "LOCK_ACQUIRED",
            Event::LockContended => "LOCK_CONTENDED",
            Event::LockReclaimed => "LOCK_RECLAIMED",
            Event::LockReleased => "LOCK_RELEASED",
            Event::LockTimeout => "LOCK_TIMEOUT",

            Event::SignalReceived => "SIGNAL_RECEIVED",

            Event::TempFileSealed => "TEMP_FILE_SEALED",
            Event::CopyBackFailed => "COPY_BACK_FAILED",
            Event::TempFileCleanupFailed => "TEMP_FILE_CLEANUP_FAILED",
        }
    }

    /// Returns true if this event means the table content can no longer be trusted
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::CopyBackFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
