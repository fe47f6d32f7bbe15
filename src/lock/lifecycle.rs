//! Process lifecycle hook for held locks
//!
//! Every artifact this process holds is registered here. On SIGINT or
//! SIGTERM (Ctrl-C elsewhere) the hook removes them all and exits with
//! status 1, so an interrupted process does not leave a lock behind. An
//! in-flight copy-back is not rolled back.
//!
//! The hook is installed at most once per process, on a dedicated thread
//! independent of the caller's runtime.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex, MutexGuard, OnceLock};
use std::thread::{self, JoinHandle};

use uuid::Uuid;

use super::artifact::remove_if_owned;
use crate::observability::{log_event_with_fields, Event, Logger};

static HELD: OnceLock<Mutex<HashMap<PathBuf, Uuid>>> = OnceLock::new();
static HOOK: OnceLock<Option<JoinHandle<()>>> = OnceLock::new();

fn held() -> MutexGuard<'static, HashMap<PathBuf, Uuid>> {
    HELD.get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Records an artifact as held by this process
pub fn register(artifact: &Path, token: Uuid) {
    held().insert(artifact.to_path_buf(), token);
}

/// Forgets an artifact once its guard released it
pub fn unregister(artifact: &Path, token: Uuid) {
    let mut held = held();
    if held.get(artifact) == Some(&token) {
        held.remove(artifact);
    }
}

/// Number of artifacts currently held by this process
pub fn held_count() -> usize {
    held().len()
}

/// Removes every artifact this process holds. Returns how many were removed.
pub fn release_all() -> usize {
    let drained: Vec<(PathBuf, Uuid)> = held().drain().collect();
    release_entries(drained)
}

fn release_entries(entries: Vec<(PathBuf, Uuid)>) -> usize {
    let mut released = 0;
    for (artifact, token) in entries {
        match remove_if_owned(&artifact, Some(token)) {
            Ok(true) => released += 1,
            Ok(false) => {}
            Err(e) => Logger::error(
                "LOCK_RELEASE_FAILED",
                &[
                    ("path", artifact.display().to_string().as_str()),
                    ("reason", e.to_string().as_str()),
                ],
            ),
        }
    }
    released
}

/// Installs the termination hook once per process.
///
/// The listener runs on its own thread with its own runtime, so it outlives
/// whichever runtime first took a lock. Returns once the signal handlers are
/// registered.
pub fn install() {
    HOOK.get_or_init(spawn_hook);
}

/// Whether the hook thread is installed and still listening
pub fn is_listening() -> bool {
    HOOK.get()
        .and_then(|hook| hook.as_ref())
        .map(|handle| !handle.is_finished())
        .unwrap_or(false)
}

fn spawn_hook() -> Option<JoinHandle<()>> {
    let (ready_tx, ready_rx) = mpsc::sync_channel::<bool>(1);

    let spawned = thread::Builder::new()
        .name("csvdb-signal-hook".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    Logger::error("SIGNAL_HOOK_FAILED", &[("reason", e.to_string().as_str())]);
                    let _ = ready_tx.send(false);
                    return;
                }
            };

            runtime.block_on(async move {
                let mut listener = match TerminationListener::register() {
                    Ok(listener) => listener,
                    Err(e) => {
                        Logger::error(
                            "SIGNAL_HOOK_FAILED",
                            &[("reason", e.to_string().as_str())],
                        );
                        let _ = ready_tx.send(false);
                        return;
                    }
                };
                let _ = ready_tx.send(true);

                let signal = listener.recv().await;
                let released = release_all();
                log_event_with_fields(
                    Event::SignalReceived,
                    &[
                        ("signal", signal),
                        ("locks_released", released.to_string().as_str()),
                    ],
                );
                std::process::exit(1);
            });
        });

    match spawned {
        Ok(handle) => match ready_rx.recv() {
            Ok(true) => Some(handle),
            _ => None,
        },
        Err(e) => {
            Logger::error("SIGNAL_HOOK_FAILED", &[("reason", e.to_string().as_str())]);
            None
        }
    }
}

#[cfg(unix)]
struct TerminationListener {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl TerminationListener {
    fn register() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }
}

#[cfg(windows)]
struct TerminationListener {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(windows)]
impl TerminationListener {
    fn register() -> std::io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        self.ctrl_c.recv().await;
        "CTRL_C"
    }
}
