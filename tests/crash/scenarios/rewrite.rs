//! Rewrite crash scenarios
//!
//! - Crash after sealing the replacement → target byte-for-byte intact
//! - Crash during copy-back → target holds a prefix of the new content

use crate::crash::{report_failure, run_csvdb, run_csvdb_with_crash_point, TestTable};
use csvdb::crash_point::points;

const HEADER_AND_ROWS: &str = "name;age\na;1\nb;2\n";

#[test]
fn test_crash_before_copy_back_keeps_original() {
    let table = TestTable::new(HEADER_AND_ROWS);

    let result = run_csvdb_with_crash_point(
        points::REWRITE_BEFORE_COPY_BACK,
        &table.args("delete", &["--where", "name=a"]),
    );
    if !result.aborted() {
        report_failure(points::REWRITE_BEFORE_COPY_BACK, "delete", &result);
        panic!("process should have aborted");
    }

    assert_eq!(table.content(), HEADER_AND_ROWS);

    // The sealed replacement is orphaned in the scratch dir
    let leftovers = table.scratch_files();
    assert_eq!(leftovers.len(), 1);
    assert_eq!(
        std::fs::read_to_string(&leftovers[0]).unwrap(),
        "name;age\nb;2\n"
    );

    // Reads never needed the lock
    let get = run_csvdb(&table.args("get", &[]));
    assert!(get.succeeded());
    assert_eq!(
        get.stdout.trim(),
        r#"[{"name":"a","age":"1"},{"name":"b","age":"2"}]"#
    );
}

#[test]
fn test_crash_mid_copy_back_leaves_prefix() {
    let mut content = String::from("name;age\n");
    for i in 0..20_000 {
        content.push_str(&format!("row{};{}\n", i, i));
    }
    let table = TestTable::new(&content);

    let result = run_csvdb_with_crash_point(
        points::REWRITE_MID_COPY_BACK,
        &table.args("delete", &["--where", "name=row0"]),
    );
    if !result.aborted() {
        report_failure(points::REWRITE_MID_COPY_BACK, "delete", &result);
        panic!("process should have aborted");
    }

    let expected = content.replacen("row0;0\n", "", 1);
    let actual = table.content();
    assert!(actual.len() < expected.len());
    assert!(
        expected.starts_with(&actual),
        "target must hold a prefix of the replacement"
    );
    assert!(table.lock_exists());
}
