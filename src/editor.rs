//! Editor facade
//!
//! Binds one table path to its delimiter, scratch directory and lock manager.
//! Reads go straight to the file. Mutations run the rewrite pipeline while
//! holding the table's lock.

use std::path::{Path, PathBuf};

use crate::codec::{Header, Record, RecordReader};
use crate::config::TableConfig;
use crate::errors::DbResult;
use crate::lock::LockManager;
use crate::rewrite::{self, RewriteOptions, RewriteOutcome};

/// Read and locked-rewrite access to one table file
#[derive(Debug, Clone)]
pub struct Editor {
    path: PathBuf,
    rewrite: RewriteOptions,
    locks: LockManager,
}

impl Editor {
    /// Creates an editor for `path`. Touches nothing on disk.
    pub fn new(path: impl Into<PathBuf>, config: &TableConfig) -> Self {
        Self {
            path: path.into(),
            rewrite: RewriteOptions {
                delimiter: config.delimiter,
                scratch_dir: config.scratch_dir(),
            },
            locks: LockManager::new(config.lock.clone()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn delimiter(&self) -> char {
        self.rewrite.delimiter
    }

    pub fn locks(&self) -> &LockManager {
        &self.locks
    }

    /// Reads the header line.
    pub async fn header(&self) -> DbResult<Header> {
        let reader = RecordReader::open(&self.path, self.rewrite.delimiter).await?;
        Ok(reader.header().clone())
    }

    /// Lazy record sequence over the current file content. Not locked.
    pub async fn records(&self) -> DbResult<RecordReader> {
        RecordReader::open(&self.path, self.rewrite.delimiter).await
    }

    /// Streams every record to `on_row` without locking.
    ///
    /// A concurrent writer may be mid copy-back; the read can then see a
    /// truncated file and fail with a format error.
    pub async fn read_all<F>(&self, mut on_row: F) -> DbResult<usize>
    where
        F: FnMut(Record),
    {
        let mut reader = self.records().await?;
        while let Some(record) = reader.next_record().await? {
            on_row(record);
        }
        Ok(reader.records_read())
    }

    /// Rewrites the table through `transform` while holding its lock.
    pub async fn locked_edit<F>(&self, transform: F) -> DbResult<RewriteOutcome>
    where
        F: FnMut(Record) -> Option<Record>,
    {
        self.locks
            .with_lock(&self.path, || rewrite::edit(&self.path, &self.rewrite, transform))
            .await
    }

    /// Appends `rows` after the existing ones while holding the table's lock.
    pub async fn locked_append(&self, rows: Vec<Record>) -> DbResult<RewriteOutcome> {
        self.locks
            .with_lock(&self.path, || rewrite::append(&self.path, &self.rewrite, rows))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LockOptions;
    use crate::errors::DbErrorCode;
    use crate::lock::artifact_path;
    use tempfile::TempDir;

    fn setup(content: &str) -> (TempDir, Editor) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, content).unwrap();
        let config = TableConfig::default()
            .with_temp_dir(dir.path())
            .with_lock(LockOptions::fast());
        let editor = Editor::new(path, &config);
        (dir, editor)
    }

    #[tokio::test]
    async fn test_read_all_counts_rows() {
        let (_dir, editor) = setup("name;age\na;1\nb;2\n");

        let mut names = Vec::new();
        let count = editor
            .read_all(|r| names.push(r.get("name").unwrap_or_default().to_string()))
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_header_reads_first_line() {
        let (_dir, editor) = setup("name;age\n");
        let header = editor.header().await.unwrap();
        assert_eq!(header.fields(), ["name", "age"]);
    }

    #[tokio::test]
    async fn test_locked_edit_releases_lock() {
        let (_dir, editor) = setup("name;age\na;1\nb;2\n");

        let outcome = editor
            .locked_edit(|r| if r.get("name") == Some("a") { None } else { Some(r) })
            .await
            .unwrap();
        assert_eq!(outcome.rows_dropped, 1);
        assert!(!artifact_path(editor.path()).exists());
        assert_eq!(
            std::fs::read_to_string(editor.path()).unwrap(),
            "name;age\nb;2\n"
        );
    }

    #[tokio::test]
    async fn test_locked_append_on_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let editor = Editor::new(dir.path().join("none.csv"), &TableConfig::default());

        let err = editor
            .locked_append(vec![Record::new().with("a", "1")])
            .await
            .unwrap_err();
        assert_eq!(err.code(), DbErrorCode::IoError);
        assert!(!artifact_path(editor.path()).exists());
    }
}
