//! Value fidelity through full rewrites
//!
//! Values that need quoting must come back identical after any number of
//! rewrites of the file they live in.

use csvdb::codec::{Header, Record, RecordReader, RecordWriter};
use csvdb::{LockOptions, Table, TableConfig};
use tempfile::TempDir;

fn tricky_rows() -> Vec<Record> {
    vec![
        Record::new().with("id", "1").with("note", "semi;colon"),
        Record::new().with("id", "2").with("note", "she said \"hi\""),
        Record::new().with("id", "3").with("note", "two\nlines"),
        Record::new().with("id", "4").with("note", "windows\r\nbreak"),
        Record::new().with("id", "5").with("note", ""),
        Record::new().with("id", "6").with("note", "  padded  "),
        Record::new().with("id", "7").with("note", "ünïcødé ✓"),
    ]
}

#[tokio::test]
async fn test_values_survive_repeated_rewrites() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("notes.csv");
    let config = TableConfig::default()
        .with_temp_dir(dir.path())
        .with_lock(LockOptions::fast());
    let table = Table::open(&file, ["id", "note"], config).await.unwrap();

    table.add(tricky_rows()).await.unwrap();
    for _ in 0..3 {
        // Matches nothing, still rewrites the whole file
        table
            .edit(&Record::new().with("id", "none"), &Record::new().with("note", "x"))
            .await
            .unwrap();
    }

    assert_eq!(table.get(None).await.unwrap(), tricky_rows());
}

#[tokio::test]
async fn test_single_column_empty_value_is_not_a_blank_line() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("one.csv");
    let header = Header::new(["only"]).unwrap();

    let mut writer = RecordWriter::create(&file, ';', header).await.unwrap();
    writer.write(&Record::new().with("only", "")).await.unwrap();
    writer.write(&Record::new().with("only", "x")).await.unwrap();
    writer.finish().await.unwrap();

    let rows = RecordReader::open(&file, ';')
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    assert_eq!(
        rows,
        vec![
            Record::new().with("only", ""),
            Record::new().with("only", "x")
        ]
    );
}

#[tokio::test]
async fn test_hand_written_file_with_blank_lines_and_crlf() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("hand.csv");
    std::fs::write(&file, "id,note\r\n1,a\r\n\r\n2,\"multi\r\nline\"\r\n\n").unwrap();

    let rows = RecordReader::open(&file, ',')
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    assert_eq!(
        rows,
        vec![
            Record::new().with("id", "1").with("note", "a"),
            Record::new().with("id", "2").with("note", "multi\r\nline"),
        ]
    );
}
