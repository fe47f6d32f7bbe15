//! Table initialization
//!
//! A missing or empty file is created with the header while holding the
//! table's lock; an existing file must already carry exactly that header.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::Table;
use crate::codec::{Header, RecordWriter};
use crate::config::TableConfig;
use crate::editor::Editor;
use crate::errors::{DbError, DbResult};
use crate::observability::{log_event_with_fields, Event};

impl Table {
    /// Opens the table at `path`, creating it with `fields` as header if the
    /// file is missing or empty.
    ///
    /// # Errors
    ///
    /// - `CSVDB_CONFIG_INVALID` for an unusable configuration
    /// - `CSVDB_FORMAT_ERROR` if `fields` is not a valid header, or the
    ///   existing file's header differs from it
    /// - `CSVDB_LOCK_TIMEOUT` if creation could not take the lock
    pub async fn open<I, S>(
        path: impl Into<PathBuf>,
        fields: I,
        config: TableConfig,
    ) -> DbResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        config.validate()?;
        let header = Header::new(fields)?;
        let editor = Editor::new(path, &config);

        if needs_header(editor.path()).await? {
            let created = editor
                .locks()
                .with_lock(editor.path(), || create_if_empty(&editor, &header))
                .await?;
            if created {
                log_event_with_fields(
                    Event::TableCreated,
                    &[
                        ("path", editor.path().display().to_string().as_str()),
                        ("header", header.to_string().as_str()),
                    ],
                );
            }
        }

        let found = editor.header().await?;
        if found != header {
            return Err(DbError::format_error(format!(
                "Table header does not match: expected [{}], found [{}]",
                header, found
            ))
            .with_details(format!("path: {}", editor.path().display())));
        }

        log_opened(&editor);
        Ok(Self { editor, header })
    }

    /// Opens an existing table and adopts whatever header it has.
    pub async fn attach(path: impl Into<PathBuf>, config: TableConfig) -> DbResult<Self> {
        config.validate()?;
        let editor = Editor::new(path, &config);
        let header = editor.header().await?;

        log_opened(&editor);
        Ok(Self { editor, header })
    }
}

async fn needs_header(path: &Path) -> DbResult<bool> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.len() == 0),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
        Err(e) => Err(DbError::io_error(
            format!("Failed to stat table: {}", path.display()),
            e,
        )),
    }
}

async fn create_if_empty(editor: &Editor, header: &Header) -> DbResult<bool> {
    // Another process may have created it while we waited for the lock
    if !needs_header(editor.path()).await? {
        return Ok(false);
    }
    let writer = RecordWriter::create(editor.path(), editor.delimiter(), header.clone()).await?;
    writer.finish().await?;
    Ok(true)
}

fn log_opened(editor: &Editor) {
    log_event_with_fields(
        Event::TableOpened,
        &[
            ("path", editor.path().display().to_string().as_str()),
            ("delimiter", editor.delimiter().to_string().as_str()),
        ],
    );
}
