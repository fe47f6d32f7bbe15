//! Lock acquisition, scoping and release

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use super::artifact::{self, artifact_path, LockOwner};
use super::backoff::RetryPolicy;
use super::lifecycle;
use crate::config::LockOptions;
use crate::crash_point::{maybe_crash, maybe_pause, points};
use crate::errors::{DbError, DbResult};
use crate::observability::{log_event_with_fields, Event, Logger};

/// Acquires advisory locks on table paths
#[derive(Debug, Clone)]
pub struct LockManager {
    options: LockOptions,
    policy: RetryPolicy,
}

impl LockManager {
    /// Creates a manager with the given policy
    pub fn new(options: LockOptions) -> Self {
        let policy = RetryPolicy::from(&options);
        Self { options, policy }
    }

    /// The retry schedule in use
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `op` while holding the lock on `target`.
    ///
    /// The lock is released exactly once after `op` finishes, whether it
    /// succeeded or failed. If `op` fails, its error is returned even when the
    /// release fails too. A release failure after `op` succeeded is logged and
    /// the value is still returned, since the protected work is already done.
    pub async fn with_lock<T, F, Fut>(&self, target: &Path, op: F) -> DbResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DbResult<T>>,
    {
        let guard = self.acquire(target).await?;
        let artifact = guard.artifact().to_path_buf();
        let result = op().await;
        let released = guard.release().await;

        match (result, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(value), Err(e)) => {
                Logger::error(
                    "LOCK_RELEASE_FAILED",
                    &[
                        ("path", artifact.display().to_string().as_str()),
                        ("reason", e.to_string().as_str()),
                    ],
                );
                Ok(value)
            }
            (Err(e), _) => Err(e),
        }
    }

    /// Acquires the lock on `target`, retrying with backoff while it is held.
    ///
    /// Stale artifacts (dead owner, or older than `stale_after_ms`) are
    /// reclaimed without consuming a wait.
    ///
    /// # Errors
    ///
    /// - `CSVDB_LOCK_TIMEOUT` once every retry is exhausted
    /// - `CSVDB_IO_ERROR` if the artifact cannot be created or inspected
    pub async fn acquire(&self, target: &Path) -> DbResult<LockGuard> {
        if self.options.release_on_signal {
            lifecycle::install();
        }

        let artifact = artifact_path(target);
        let artifact_display = artifact.display().to_string();
        let max_attempts = self.policy.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            let owner = LockOwner::current();
            if artifact::try_create(&artifact, &owner).await? {
                lifecycle::register(&artifact, owner.token);
                log_event_with_fields(
                    Event::LockAcquired,
                    &[
                        ("path", artifact_display.as_str()),
                        ("attempts", (attempt + 1).to_string().as_str()),
                    ],
                );
                let heartbeat = spawn_heartbeat(
                    artifact.clone(),
                    owner.token,
                    self.options.stale_after() / 2,
                );
                maybe_crash(points::LOCK_AFTER_ACQUIRE);
                maybe_pause(points::LOCK_AFTER_ACQUIRE_WAIT).await;
                return Ok(LockGuard {
                    artifact,
                    token: owner.token,
                    heartbeat: Some(heartbeat),
                    released: false,
                });
            }

            if self.reclaim_if_stale(&artifact).await? {
                continue;
            }

            attempt += 1;
            if attempt >= max_attempts {
                log_event_with_fields(
                    Event::LockTimeout,
                    &[
                        ("path", artifact_display.as_str()),
                        ("attempts", attempt.to_string().as_str()),
                    ],
                );
                return Err(DbError::lock_timeout(artifact_display, attempt));
            }

            let delay = self.policy.delay(attempt - 1, &mut rand::thread_rng());
            Logger::trace(
                Event::LockContended.as_str(),
                &[
                    ("path", artifact_display.as_str()),
                    ("attempt", attempt.to_string().as_str()),
                    ("delay_ms", delay.as_millis().to_string().as_str()),
                ],
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn reclaim_if_stale(&self, artifact: &Path) -> DbResult<bool> {
        let state = match artifact::inspect(artifact).await? {
            Some(state) => state,
            // Vanished between our create attempt and the inspection
            None => return Ok(true),
        };

        let reason = match state.staleness(self.options.stale_after(), Utc::now()) {
            Some(reason) => reason,
            None => return Ok(false),
        };

        let token = state.owner.as_ref().map(|o| o.token);
        if artifact::remove_if_owned(artifact, token)? {
            let pid = state
                .owner
                .as_ref()
                .map(|o| o.pid.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            log_event_with_fields(
                Event::LockReclaimed,
                &[
                    ("path", artifact.display().to_string().as_str()),
                    ("reason", reason.as_str()),
                    ("stale_pid", pid.as_str()),
                ],
            );
        }
        Ok(true)
    }
}

/// Keeps a held artifact's mtime fresh so waiters never see it as expired.
/// Stops once the artifact is gone or owned by someone else.
fn spawn_heartbeat(artifact: PathBuf, token: Uuid, period: Duration) -> JoinHandle<()> {
    let period = period.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let path = artifact.clone();
            match tokio::task::spawn_blocking(move || artifact::refresh(&path, token)).await {
                Ok(Ok(true)) => {}
                Ok(Ok(false)) | Err(_) => break,
                Ok(Err(e)) => Logger::warn(
                    "LOCK_REFRESH_FAILED",
                    &[
                        ("path", artifact.display().to_string().as_str()),
                        ("reason", e.to_string().as_str()),
                    ],
                ),
            }
        }
    })
}

/// Exclusive ownership of one table's lock
///
/// While held, a background task refreshes the artifact every
/// `stale_after / 2`. Release with [`LockGuard::release`]. Dropping an
/// unreleased guard (panic, cancelled future) removes the artifact
/// synchronously.
#[derive(Debug)]
pub struct LockGuard {
    artifact: PathBuf,
    token: Uuid,
    heartbeat: Option<JoinHandle<()>>,
    released: bool,
}

impl LockGuard {
    /// Path of the lock artifact
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Token written into the artifact
    pub fn token(&self) -> Uuid {
        self.token
    }

    /// Removes the artifact.
    pub async fn release(mut self) -> DbResult<()> {
        self.released = true;
        self.stop_heartbeat();
        let path = self.artifact.clone();
        let token = self.token;

        let removed =
            tokio::task::spawn_blocking(move || artifact::remove_if_owned(&path, Some(token)))
                .await
                .unwrap_or_else(|e| {
                    Err(DbError::io_error(
                        "Lock release task failed",
                        std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
                    ))
                });
        self.finish(removed)
    }

    fn stop_heartbeat(&mut self) {
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.abort();
        }
    }

    fn finish(&self, removed: DbResult<bool>) -> DbResult<()> {
        lifecycle::unregister(&self.artifact, self.token);
        let artifact_display = self.artifact.display().to_string();
        match removed {
            Ok(true) => {
                log_event_with_fields(Event::LockReleased, &[("path", artifact_display.as_str())]);
                Ok(())
            }
            Ok(false) => {
                // Reclaimed by another process as stale while we held it
                Logger::warn(
                    "LOCK_LOST",
                    &[
                        ("path", artifact_display.as_str()),
                        ("token", self.token.to_string().as_str()),
                    ],
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.stop_heartbeat();
        if let Err(e) = self.finish(artifact::remove_if_owned(&self.artifact, Some(self.token))) {
            Logger::error(
                "LOCK_RELEASE_FAILED",
                &[
                    ("path", self.artifact.display().to_string().as_str()),
                    ("reason", e.to_string().as_str()),
                ],
            );
        }
    }
}
