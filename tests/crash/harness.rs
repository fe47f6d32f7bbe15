//! Crash test harness for subprocess management
//!
//! Runs the `csvdb` binary, optionally with a crash point injected, and
//! captures how it ended.

use std::process::{Child, Command, ExitStatus, Stdio};

/// Result of one csvdb invocation
#[derive(Debug)]
pub struct RunResult {
    /// Exit status, `None` if the process could not be spawned
    pub exit_status: Option<ExitStatus>,
    /// stdout output
    pub stdout: String,
    /// stderr output
    pub stderr: String,
}

impl RunResult {
    pub fn succeeded(&self) -> bool {
        self.exit_status.map(|s| s.success()).unwrap_or(false)
    }

    /// Killed by a signal (abort) rather than exiting
    #[cfg(unix)]
    pub fn aborted(&self) -> bool {
        use std::os::unix::process::ExitStatusExt;
        self.exit_status.and_then(|s| s.signal()).is_some()
    }

    #[cfg(not(unix))]
    pub fn aborted(&self) -> bool {
        !self.succeeded()
    }
}

/// Run csvdb with the given arguments and no crash point
pub fn run_csvdb(args: &[&str]) -> RunResult {
    execute(args, None)
}

/// Run csvdb with `CSVDB_CRASH_POINT` set
pub fn run_csvdb_with_crash_point(crash_point: &str, args: &[&str]) -> RunResult {
    execute(args, Some(crash_point))
}

/// Start csvdb in the background with `CSVDB_CRASH_POINT` set, for pause points
pub fn spawn_csvdb_with_crash_point(crash_point: &str, args: &[&str]) -> Child {
    command(args, Some(crash_point))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn csvdb")
}

/// Wait for a spawned csvdb to finish and collect its output
pub fn wait_for(child: Child) -> RunResult {
    collect(child.wait_with_output())
}

fn command(args: &[&str], crash_point: Option<&str>) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_csvdb"));
    command.args(args).env("CSVDB_LOG", "off");
    match crash_point {
        Some(point) => command.env("CSVDB_CRASH_POINT", point),
        None => command.env_remove("CSVDB_CRASH_POINT"),
    };
    command
}

fn execute(args: &[&str], crash_point: Option<&str>) -> RunResult {
    collect(command(args, crash_point).output())
}

fn collect(output: std::io::Result<std::process::Output>) -> RunResult {
    match output {
        Ok(output) => RunResult {
            exit_status: Some(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        },
        Err(e) => RunResult {
            exit_status: None,
            stdout: String::new(),
            stderr: format!("Failed to execute: {}", e),
        },
    }
}

/// Report crash test failure
pub fn report_failure(crash_point: &str, operation: &str, result: &RunResult) {
    eprintln!("=== CRASH TEST FAILURE ===");
    eprintln!("Crash point: {}", crash_point);
    eprintln!("Operation: {}", operation);
    eprintln!("Exit: {:?}", result.exit_status);
    eprintln!("stdout:\n{}", result.stdout);
    eprintln!("stderr:\n{}", result.stderr);
    eprintln!("==========================");
}
