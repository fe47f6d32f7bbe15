//! Crash point injection for testing crash behaviour
//!
//! When `CSVDB_CRASH_POINT` names a point that execution reaches, the process
//! terminates immediately via `std::process::abort()`: no cleanup, no
//! unwinding, no lock release, no temp file removal.
//!
//! Pause points instead hold the process still at that point so a test can
//! act on it from outside (for example, send it a signal).
//!
//! ```bash
//! CSVDB_CRASH_POINT=lock_after_acquire csvdb add --file t.csv --set name=a
//! ```

use std::sync::OnceLock;
use std::time::Duration;

static CRASH_POINT: OnceLock<Option<String>> = OnceLock::new();

#[inline]
fn get_crash_point() -> Option<&'static str> {
    CRASH_POINT
        .get_or_init(|| std::env::var("CSVDB_CRASH_POINT").ok())
        .as_deref()
}

/// Returns true if `CSVDB_CRASH_POINT` equals the given name.
#[inline]
pub fn crash_point_enabled(name: &str) -> bool {
    get_crash_point().map(|p| p == name).unwrap_or(false)
}

/// Abort the process if the named crash point is enabled.
#[inline]
pub fn maybe_crash(name: &str) {
    if crash_point_enabled(name) {
        eprintln!("[CRASH] Triggering crash at point: {}", name);
        std::process::abort();
    }
}

/// How long a pause point holds the process
const PAUSE: Duration = Duration::from_secs(60);

/// Sleep at the named point if it is enabled.
pub async fn maybe_pause(name: &str) {
    if crash_point_enabled(name) {
        eprintln!("[PAUSE] Holding at point: {}", name);
        tokio::time::sleep(PAUSE).await;
    }
}

/// All defined crash point names
pub mod points {
    /// Lock artifact written, protected operation not started
    pub const LOCK_AFTER_ACQUIRE: &str = "lock_after_acquire";
    /// Lock held, process paused instead of aborted
    pub const LOCK_AFTER_ACQUIRE_WAIT: &str = "lock_after_acquire_wait";

    /// Temp file sealed, target not yet touched
    pub const REWRITE_BEFORE_COPY_BACK: &str = "rewrite_before_copy_back";
    /// Target truncated and first chunk copied
    pub const REWRITE_MID_COPY_BACK: &str = "rewrite_mid_copy_back";

    /// Get all crash point names
    pub fn all() -> &'static [&'static str] {
        &[
            LOCK_AFTER_ACQUIRE,
            LOCK_AFTER_ACQUIRE_WAIT,
            REWRITE_BEFORE_COPY_BACK,
            REWRITE_MID_COPY_BACK,
        ]
    }
}
