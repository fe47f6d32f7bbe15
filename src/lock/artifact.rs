//! On-disk lock artifact
//!
//! `<target>.lock`, created with exclusive-create semantics beside the table.
//! Its content records who owns it:
//!
//! ```json
//! {"pid": 4242, "token": "6f1c…", "acquired_at": "2026-10-16T09:12:44.120Z"}
//! ```
//!
//! The token distinguishes two acquisitions by the same process, so a
//! release or reclaim never removes an artifact it did not inspect.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::errors::{DbError, DbResult};

/// Identity recorded inside a lock artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockOwner {
    /// Owning process id
    pub pid: u32,
    /// Unique per acquisition
    pub token: Uuid,
    /// When the artifact was created
    pub acquired_at: DateTime<Utc>,
}

impl LockOwner {
    /// A fresh identity for this process
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
            token: Uuid::new_v4(),
            acquired_at: Utc::now(),
        }
    }

    /// Age of the acquisition; zero if the clock moved backwards
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.acquired_at).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Why an artifact may be reclaimed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// Recorded owner process no longer exists
    OwnerDead,
    /// Older than the staleness threshold
    Expired,
}

impl StaleReason {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            StaleReason::OwnerDead => "owner_dead",
            StaleReason::Expired => "expired",
        }
    }
}

/// What an inspection of an existing artifact found
#[derive(Debug, Clone)]
pub struct ArtifactState {
    /// Parsed owner, `None` if the content is empty or unreadable
    pub owner: Option<LockOwner>,
    /// Filesystem modification time
    pub modified: SystemTime,
}

impl ArtifactState {
    /// Decides whether the artifact can be reclaimed.
    ///
    /// Age is measured from the later of `acquired_at` and the file's mtime,
    /// which a live holder keeps refreshing. A half-written artifact (no
    /// parsable owner) only has its mtime to go by.
    pub fn staleness(&self, stale_after: Duration, now: DateTime<Utc>) -> Option<StaleReason> {
        let now = SystemTime::from(now);
        let freshest = match &self.owner {
            Some(owner) => {
                if owner.pid != std::process::id() && !process_alive(owner.pid) {
                    return Some(StaleReason::OwnerDead);
                }
                self.modified.max(SystemTime::from(owner.acquired_at))
            }
            None => self.modified,
        };

        let age = now.duration_since(freshest).unwrap_or(Duration::ZERO);
        (age > stale_after).then_some(StaleReason::Expired)
    }
}

/// Lock artifact path for a target: the file name with `.lock` appended.
pub fn artifact_path(target: &Path) -> PathBuf {
    let mut name: OsString = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    target.with_file_name(name)
}

/// Attempts to create the artifact.
///
/// Returns `Ok(false)` if another owner's artifact already exists.
pub async fn try_create(artifact: &Path, owner: &LockOwner) -> DbResult<bool> {
    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(artifact)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => {
            return Err(DbError::io_error(
                format!("Failed to create lock artifact: {}", artifact.display()),
                e,
            ))
        }
    };

    let json = serde_json::to_vec(owner).map_err(|e| {
        DbError::io_error(
            "Failed to encode lock owner",
            std::io::Error::new(ErrorKind::InvalidData, e),
        )
    })?;

    let written = async {
        file.write_all(&json).await?;
        file.sync_all().await
    }
    .await;

    if let Err(e) = written {
        let _ = tokio::fs::remove_file(artifact).await;
        return Err(DbError::io_error(
            format!("Failed to write lock artifact: {}", artifact.display()),
            e,
        ));
    }
    Ok(true)
}

/// Reads an existing artifact. `Ok(None)` if it vanished meanwhile.
pub async fn inspect(artifact: &Path) -> DbResult<Option<ArtifactState>> {
    let metadata = match tokio::fs::metadata(artifact).await {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(DbError::io_error(
                format!("Failed to stat lock artifact: {}", artifact.display()),
                e,
            ))
        }
    };

    let content = match tokio::fs::read(artifact).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(DbError::io_error(
                format!("Failed to read lock artifact: {}", artifact.display()),
                e,
            ))
        }
    };

    Ok(Some(ArtifactState {
        owner: serde_json::from_slice(&content).ok(),
        modified: metadata.modified().unwrap_or_else(|_| SystemTime::now()),
    }))
}

/// Removes the artifact only if it still carries `expected` as owner token
/// (`None` matches an unreadable artifact). Returns whether it was removed.
pub fn remove_if_owned(artifact: &Path, expected: Option<Uuid>) -> DbResult<bool> {
    let content = match fs::read(artifact) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => {
            return Err(DbError::io_error(
                format!("Failed to read lock artifact: {}", artifact.display()),
                e,
            ))
        }
    };

    let current = serde_json::from_slice::<LockOwner>(&content)
        .ok()
        .map(|o| o.token);
    if current != expected {
        return Ok(false);
    }

    match fs::remove_file(artifact) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(DbError::io_error(
            format!("Failed to remove lock artifact: {}", artifact.display()),
            e,
        )),
    }
}

/// Bumps the artifact's mtime if it still carries `token`.
///
/// Returns `Ok(false)` if the artifact is gone or now belongs to someone else.
pub fn refresh(artifact: &Path, token: Uuid) -> DbResult<bool> {
    let content = match fs::read(artifact) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => {
            return Err(DbError::io_error(
                format!("Failed to read lock artifact: {}", artifact.display()),
                e,
            ))
        }
    };
    let current = serde_json::from_slice::<LockOwner>(&content)
        .ok()
        .map(|o| o.token);
    if current != Some(token) {
        return Ok(false);
    }

    fs::OpenOptions::new()
        .write(true)
        .open(artifact)
        .and_then(|file| file.set_modified(SystemTime::now()))
        .map_err(|e| {
            DbError::io_error(
                format!("Failed to refresh lock artifact: {}", artifact.display()),
                e,
            )
        })?;
    Ok(true)
}

/// Whether a process with this pid is running on this host.
///
/// Zombies count as dead. On platforms without `/proc` liveness is unknown
/// and the process is assumed alive, leaving reclamation to the age check.
#[cfg(target_os = "linux")]
pub fn process_alive(pid: u32) -> bool {
    match fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => {
            // State is the first field after the parenthesised command name
            let state = stat
                .rfind(')')
                .and_then(|i| stat[i + 1..].split_whitespace().next());
            !matches!(state, Some("Z") | Some("X"))
        }
        Err(e) => e.kind() != ErrorKind::NotFound,
    }
}

#[cfg(not(target_os = "linux"))]
pub fn process_alive(_pid: u32) -> bool {
    true
}
