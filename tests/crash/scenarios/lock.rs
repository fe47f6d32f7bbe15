//! Lock crash scenarios
//!
//! - Crash right after acquiring → artifact left behind, table untouched
//! - Next writer reclaims the artifact of the dead process
//! - SIGTERM while holding the lock → artifact removed, exit status 1

use crate::crash::{report_failure, run_csvdb, run_csvdb_with_crash_point, TestTable};
#[cfg(unix)]
use crate::crash::{spawn_csvdb_with_crash_point, wait_for};
use csvdb::crash_point::points;

const HEADER_AND_ROWS: &str = "name;age\na;1\nb;2\n";

#[test]
fn test_crash_after_acquire_leaves_table_untouched() {
    let table = TestTable::new(HEADER_AND_ROWS);

    let result = run_csvdb_with_crash_point(
        points::LOCK_AFTER_ACQUIRE,
        &table.args("add", &["--set", "name=c", "--set", "age=3"]),
    );
    if !result.aborted() {
        report_failure(points::LOCK_AFTER_ACQUIRE, "add", &result);
        panic!("process should have aborted");
    }

    assert!(table.lock_exists(), "aborted process must leave its lock");
    assert_eq!(table.content(), HEADER_AND_ROWS);
    assert!(table.scratch_files().is_empty());
}

#[cfg(target_os = "linux")]
#[test]
fn test_lock_of_dead_process_is_reclaimed() {
    let table = TestTable::new(HEADER_AND_ROWS);

    let crashed = run_csvdb_with_crash_point(
        points::LOCK_AFTER_ACQUIRE,
        &table.args("add", &["--set", "name=c", "--set", "age=3"]),
    );
    assert!(crashed.aborted());
    assert!(table.lock_exists());

    let result = run_csvdb(&table.args("add", &["--set", "name=d", "--set", "age=4"]));
    if !result.succeeded() {
        report_failure("none", "add after crash", &result);
        panic!("add after crash should succeed");
    }

    assert_eq!(table.content(), "name;age\na;1\nb;2\nd;4\n");
    assert!(!table.lock_exists());
}

#[cfg(unix)]
#[test]
fn test_sigterm_while_holding_releases_lock() {
    use std::io::{BufRead, BufReader};
    use std::process::Command;

    let table = TestTable::releasing_on_signal(HEADER_AND_ROWS);
    let mut child = spawn_csvdb_with_crash_point(
        points::LOCK_AFTER_ACQUIRE_WAIT,
        &table.args("add", &["--set", "name=c", "--set", "age=3"]),
    );

    // Block until the child reports it is paused with the lock held
    let stderr = child.stderr.take().expect("stderr is piped");
    let mut lines = BufReader::new(stderr).lines();
    let paused = lines
        .by_ref()
        .map_while(Result::ok)
        .any(|line| line.contains("[PAUSE]"));
    assert!(paused, "csvdb exited before reaching the pause point");
    assert!(table.lock_exists(), "paused process must hold the lock");

    let status = Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .expect("Failed to run kill");
    assert!(status.success());

    let result = wait_for(child);
    drop(lines);
    if result.exit_status.and_then(|s| s.code()) != Some(1) {
        report_failure(points::LOCK_AFTER_ACQUIRE_WAIT, "add + SIGTERM", &result);
        panic!("process should exit with status 1 after SIGTERM");
    }

    assert!(!table.lock_exists(), "signal hook must remove the lock");
    assert_eq!(table.content(), HEADER_AND_ROWS);
}
