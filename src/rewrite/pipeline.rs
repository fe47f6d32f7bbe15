//! Decode-transform-encode-copy rewrite of a whole table
//!
//! Sequence for every rewrite:
//!
//! 1. Open the source for decoding (missing source fails before any temp file exists)
//! 2. Create the replacement file in the scratch directory
//! 3. Stream records through the transform into the replacement file
//! 4. Seal the replacement file (flush + fsync)
//! 5. Copy the replacement bytes over the target (truncate, copy, fsync)
//! 6. Drop the replacement file
//!
//! A failure before step 5 leaves the target untouched. A failure after the
//! target was truncated is reported as `CSVDB_PARTIAL_WRITE`. A failure in
//! step 6 is only logged: the target already holds the new content.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::temp::TempReplacement;
use crate::codec::{Record, RecordReader, RecordWriter};
use crate::crash_point::{maybe_crash, points};
use crate::errors::{DbError, DbResult};
use crate::observability::{log_event_with_fields, Event, ObservationScope, Timer};

const COPY_CHUNK_SIZE: usize = 64 * 1024;

/// Where and how a rewrite runs
#[derive(Debug, Clone)]
pub struct RewriteOptions {
    /// Field delimiter of the table
    pub delimiter: char,
    /// Directory for the replacement file
    pub scratch_dir: PathBuf,
}

impl RewriteOptions {
    /// Options with the system temp dir as scratch
    pub fn new(delimiter: char) -> Self {
        Self {
            delimiter,
            scratch_dir: std::env::temp_dir(),
        }
    }
}

/// Counters describing a completed rewrite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// Records decoded from the source
    pub rows_read: usize,
    /// Records encoded into the replacement, appended rows included
    pub rows_written: usize,
    /// Source records the transform dropped
    pub rows_dropped: usize,
    /// New records written after the source was exhausted
    pub rows_appended: usize,
    /// Bytes copied back over the target
    pub bytes_copied: u64,
}

/// Rewrites `target`, passing each record through `transform`.
///
/// `Some(record)` keeps (or replaces) the row, `None` drops it. Surviving rows
/// keep their relative order. Dropping every row yields a header-only file.
pub async fn edit<F>(
    target: &Path,
    options: &RewriteOptions,
    transform: F,
) -> DbResult<RewriteOutcome>
where
    F: FnMut(Record) -> Option<Record>,
{
    run(target, options, "REWRITE_EDIT", transform, Vec::new()).await
}

/// Rewrites `target` with every existing row unchanged followed by `rows`.
pub async fn append(
    target: &Path,
    options: &RewriteOptions,
    rows: Vec<Record>,
) -> DbResult<RewriteOutcome> {
    run(target, options, "REWRITE_APPEND", Some, rows).await
}

async fn run<F>(
    target: &Path,
    options: &RewriteOptions,
    scope_name: &'static str,
    transform: F,
    trailing: Vec<Record>,
) -> DbResult<RewriteOutcome>
where
    F: FnMut(Record) -> Option<Record>,
{
    let target_display = target.display().to_string();
    let scope = ObservationScope::with_fields(scope_name, &[("path", target_display.as_str())]);
    let timer = Timer::new();

    match rewrite(target, options, transform, trailing).await {
        Ok(outcome) => {
            scope.complete_with_fields(&[
                ("rows_read", outcome.rows_read.to_string().as_str()),
                ("rows_written", outcome.rows_written.to_string().as_str()),
                ("rows_dropped", outcome.rows_dropped.to_string().as_str()),
                ("bytes_copied", outcome.bytes_copied.to_string().as_str()),
                ("duration_ms", timer.elapsed_ms().as_str()),
            ]);
            Ok(outcome)
        }
        Err(e) if e.is_fatal() => {
            scope.fail_fatal(&e.to_string());
            Err(e)
        }
        Err(e) => {
            scope.fail(&e.to_string());
            Err(e)
        }
    }
}

async fn rewrite<F>(
    target: &Path,
    options: &RewriteOptions,
    mut transform: F,
    trailing: Vec<Record>,
) -> DbResult<RewriteOutcome>
where
    F: FnMut(Record) -> Option<Record>,
{
    let mut source = RecordReader::open(target, options.delimiter).await?;
    let header = source.header().clone();

    let (replacement, file) = TempReplacement::create(&options.scratch_dir)?;
    let mut sink =
        RecordWriter::from_file(replacement.path(), file, options.delimiter, header, false);

    let mut outcome = RewriteOutcome::default();

    while let Some(record) = source.next_record().await? {
        outcome.rows_read += 1;
        match transform(record) {
            Some(kept) => {
                sink.write(&kept).await?;
                outcome.rows_written += 1;
            }
            None => outcome.rows_dropped += 1,
        }
    }
    drop(source);

    for row in &trailing {
        sink.write(row).await?;
        outcome.rows_written += 1;
        outcome.rows_appended += 1;
    }

    // No copy-back may start before every replacement byte is on disk
    sink.finish().await?;
    log_event_with_fields(
        Event::TempFileSealed,
        &[
            ("path", replacement.path().display().to_string().as_str()),
            ("rows", outcome.rows_written.to_string().as_str()),
        ],
    );

    maybe_crash(points::REWRITE_BEFORE_COPY_BACK);

    outcome.bytes_copied = copy_back(replacement.path(), target).await?;
    discard_replacement(replacement);
    Ok(outcome)
}

/// Removes a replacement file whose content is already in place.
/// Returns false, after logging, if removal failed.
fn discard_replacement(replacement: TempReplacement) -> bool {
    let path = replacement.path().display().to_string();
    match replacement.discard() {
        Ok(()) => true,
        Err(e) => {
            log_event_with_fields(
                Event::TempFileCleanupFailed,
                &[("path", path.as_str()), ("reason", e.to_string().as_str())],
            );
            false
        }
    }
}

/// Copies the full content of `from` over `to`.
///
/// Not crash-atomic: once `to` is truncated, any failure leaves it partially
/// written and is reported as `CSVDB_PARTIAL_WRITE`.
pub async fn copy_back(from: &Path, to: &Path) -> DbResult<u64> {
    let mut source = File::open(from).await.map_err(|e| {
        DbError::io_error(format!("Failed to reopen replacement: {}", from.display()), e)
    })?;

    let mut dest = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(to)
        .await
        .map_err(|e| DbError::io_error(format!("Failed to open target: {}", to.display()), e))?;

    let partial = |e: std::io::Error, stage: &str| {
        log_event_with_fields(
            Event::CopyBackFailed,
            &[("path", to.display().to_string().as_str()), ("stage", stage)],
        );
        DbError::partial_write(format!("Copy-back failed during {}: {}", stage, to.display()), e)
    };

    let mut buffer = vec![0u8; COPY_CHUNK_SIZE];
    let mut copied: u64 = 0;
    loop {
        let n = source.read(&mut buffer).await.map_err(|e| partial(e, "read"))?;
        if n == 0 {
            break;
        }
        dest.write_all(&buffer[..n]).await.map_err(|e| partial(e, "write"))?;
        copied += n as u64;
        maybe_crash(points::REWRITE_MID_COPY_BACK);
    }

    dest.flush().await.map_err(|e| partial(e, "flush"))?;
    dest.sync_all().await.map_err(|e| partial(e, "fsync"))?;

    Ok(copied)
}
