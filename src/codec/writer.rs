//! Streaming record encoder
//!
//! The header line is emitted before the first record, or on `finish()` if no
//! record was written, unless the writer was opened in append mode onto a
//! file that already has content.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

use super::format::encode_fields;
use super::record::{Header, Record};
use crate::errors::{DbError, DbResult};

/// Streaming encoder onto a delimited file
pub struct RecordWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    delimiter: char,
    header: Header,
    header_written: bool,
    records_written: usize,
}

impl RecordWriter {
    /// Creates (or truncates) a file and writes records from the start.
    pub async fn create(path: &Path, delimiter: char, header: Header) -> DbResult<Self> {
        let file = File::create(path).await.map_err(|e| {
            DbError::io_error(format!("Failed to create file: {}", path.display()), e)
        })?;
        Ok(Self::from_file(path, file, delimiter, header, false))
    }

    /// Opens a file in append mode.
    ///
    /// A header is only emitted if the file is empty; the caller is responsible
    /// for a non-empty file already starting with a matching header.
    pub async fn append(path: &Path, delimiter: char, header: Header) -> DbResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| {
                DbError::io_error(format!("Failed to open for append: {}", path.display()), e)
            })?;

        let len = file
            .metadata()
            .await
            .map_err(|e| DbError::io_error("Failed to read file metadata", e))?
            .len();

        Ok(Self::from_file(path, file, delimiter, header, len > 0))
    }

    /// Wraps an already-open file positioned where records should go.
    pub fn from_file(
        path: &Path,
        file: File,
        delimiter: char,
        header: Header,
        header_written: bool,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            delimiter,
            header,
            header_written,
            records_written: 0,
        }
    }

    /// Header this writer encodes against
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Number of records written so far
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Encodes one record in header order.
    ///
    /// Fields missing from the record are written empty. Fields the header
    /// does not name are rejected with `CSVDB_FORMAT_ERROR` before anything is
    /// written.
    pub async fn write(&mut self, record: &Record) -> DbResult<()> {
        let line = encode_fields(self.header.values_of(record)?, self.delimiter);
        self.ensure_header().await?;
        self.write_line(&line).await?;
        self.records_written += 1;
        Ok(())
    }

    /// Flushes buffered output and fsyncs the file.
    pub async fn finish(mut self) -> DbResult<()> {
        self.ensure_header().await?;
        self.writer.flush().await.map_err(|e| {
            DbError::io_error(format!("Failed to flush: {}", self.path.display()), e)
        })?;
        self.writer.get_mut().sync_all().await.map_err(|e| {
            DbError::io_error(format!("Failed to fsync: {}", self.path.display()), e)
        })?;
        Ok(())
    }

    async fn ensure_header(&mut self) -> DbResult<()> {
        if self.header_written {
            return Ok(());
        }
        let line = encode_fields(self.header.fields().iter().map(String::as_str), self.delimiter);
        self.write_line(&line).await?;
        self.header_written = true;
        Ok(())
    }

    async fn write_line(&mut self, line: &str) -> DbResult<()> {
        self.writer.write_all(line.as_bytes()).await.map_err(|e| {
            DbError::io_error(format!("Failed to write: {}", self.path.display()), e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RecordReader;
    use crate::errors::DbErrorCode;
    use tempfile::TempDir;

    fn header() -> Header {
        Header::new(["name", "age"]).unwrap()
    }

    #[tokio::test]
    async fn test_create_writes_header_then_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");

        let mut writer = RecordWriter::create(&path, ';', header()).await.unwrap();
        writer
            .write(&Record::new().with("name", "a").with("age", "1"))
            .await
            .unwrap();
        writer.write(&Record::new().with("age", "2")).await.unwrap();
        assert_eq!(writer.records_written(), 2);
        writer.finish().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "name;age\na;1\n;2\n");
    }

    #[tokio::test]
    async fn test_finish_without_rows_writes_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");

        RecordWriter::create(&path, ';', header())
            .await
            .unwrap()
            .finish()
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "name;age\n");
    }

    #[tokio::test]
    async fn test_append_does_not_repeat_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "name;age\na;1\n").unwrap();

        let mut writer = RecordWriter::append(&path, ';', header()).await.unwrap();
        writer
            .write(&Record::new().with("name", "b").with("age", "2"))
            .await
            .unwrap();
        writer.finish().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "name;age\na;1\nb;2\n");
    }

    #[tokio::test]
    async fn test_append_onto_empty_file_writes_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");

        let mut writer = RecordWriter::append(&path, ';', header()).await.unwrap();
        writer.write(&Record::new().with("name", "a")).await.unwrap();
        writer.finish().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "name;age\na;\n");
    }

    #[tokio::test]
    async fn test_unknown_field_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");

        let mut writer = RecordWriter::create(&path, ';', header()).await.unwrap();
        let err = writer
            .write(&Record::new().with("email", "x"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), DbErrorCode::FormatError);
        assert_eq!(writer.records_written(), 0);
    }

    #[tokio::test]
    async fn test_written_rows_decode_identically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");
        let record = Record::new()
            .with("name", "semi;colon \"quoted\"")
            .with("age", "multi\nline\r\nvalue");

        let mut writer = RecordWriter::create(&path, ';', header()).await.unwrap();
        writer.write(&record).await.unwrap();
        writer.finish().await.unwrap();

        let records = RecordReader::open(&path, ';')
            .await
            .unwrap()
            .collect_all()
            .await
            .unwrap();
        assert_eq!(records, vec![record]);
    }
}
