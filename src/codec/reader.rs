//! Streaming record decoder
//!
//! Reads the header line on open, then yields one `Record` per call to
//! `next_record`. The sequence is lazy, finite and non-restartable.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::format::{is_blank, parse_fields, Parsed};
use super::record::{Header, Record};
use crate::errors::{DbError, DbResult};

/// Physical-line source that reassembles multi-line records
struct LineSource {
    path: PathBuf,
    reader: BufReader<File>,
    delimiter: char,
    /// Physical lines consumed so far
    line_number: usize,
}

impl LineSource {
    /// Reads physical lines until they form one record, skipping blank lines.
    async fn read_fields(&mut self) -> DbResult<Option<Vec<String>>> {
        let mut buffer = String::new();
        let start_line = self.line_number + 1;

        loop {
            let read = self.reader.read_line(&mut buffer).await.map_err(|e| {
                DbError::io_error(format!("Failed to read table: {}", self.path.display()), e)
                    .with_details(format!("line: {}", self.line_number + 1))
            })?;

            if read == 0 {
                if buffer.is_empty() {
                    return Ok(None);
                }
                return Err(DbError::format_error_at_line(
                    start_line,
                    "Unterminated quoted field at end of file",
                ));
            }
            self.line_number += 1;

            if is_blank(&buffer) {
                buffer.clear();
                continue;
            }

            if let Parsed::Complete(fields) = parse_fields(&buffer, self.delimiter) {
                return Ok(Some(fields));
            }
        }
    }
}

/// Streaming decoder over a delimited file
pub struct RecordReader {
    lines: LineSource,
    header: Header,
    /// Data records yielded so far
    records_read: usize,
}

impl RecordReader {
    /// Opens a delimited file and decodes its header line.
    ///
    /// # Errors
    ///
    /// - `CSVDB_IO_ERROR` if the file cannot be opened or read
    /// - `CSVDB_FORMAT_ERROR` if the file has no usable header line
    pub async fn open(path: &Path, delimiter: char) -> DbResult<Self> {
        let file = File::open(path).await.map_err(|e| {
            DbError::io_error(format!("Failed to open table: {}", path.display()), e)
        })?;

        let mut lines = LineSource {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            delimiter,
            line_number: 0,
        };

        let fields = lines.read_fields().await?.ok_or_else(|| {
            DbError::format_error(format!("Table has no header line: {}", path.display()))
        })?;
        let header = Header::new(fields)
            .map_err(|e| e.with_details(format!("path: {}", path.display())))?;

        Ok(Self {
            lines,
            header,
            records_read: 0,
        })
    }

    /// The decoded header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Path being read
    pub fn path(&self) -> &Path {
        &self.lines.path
    }

    /// Number of records yielded so far
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Decodes the next record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` for the next data line
    /// - `Ok(None)` at end of file
    /// - `Err(CSVDB_FORMAT_ERROR)` if the field count differs from the header
    pub async fn next_record(&mut self) -> DbResult<Option<Record>> {
        let start_line = self.lines.line_number + 1;
        let values = match self.lines.read_fields().await? {
            Some(values) => values,
            None => return Ok(None),
        };

        if values.len() != self.header.len() {
            return Err(DbError::format_error_at_line(
                start_line,
                format!(
                    "Expected {} fields, found {}",
                    self.header.len(),
                    values.len()
                ),
            ));
        }

        self.records_read += 1;
        Ok(Some(self.header.record_from_values(values)))
    }

    /// Drains the remaining records into a vector
    pub async fn collect_all(mut self) -> DbResult<Vec<Record>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record().await? {
            records.push(record);
        }
        Ok(records)
    }
}
