//! CRUD verbs
//!
//! Reads stream the file without locking. Every mutation is a full locked
//! rewrite of the table.

use super::predicate::is_subset_of;
use super::Table;
use crate::codec::Record;
use crate::errors::DbResult;

impl Table {
    /// All rows, or the rows matching `filter`.
    pub async fn get(&self, filter: Option<&Record>) -> DbResult<Vec<Record>> {
        let mut rows = Vec::new();
        self.editor
            .read_all(|row| {
                if filter.map_or(true, |f| is_subset_of(f, &row)) {
                    rows.push(row);
                }
            })
            .await?;
        Ok(rows)
    }

    /// Appends `rows` and returns them as written: header order, missing
    /// fields empty.
    ///
    /// Unknown field names are rejected before the lock is taken, leaving the
    /// file untouched.
    pub async fn add(&self, rows: Vec<Record>) -> DbResult<Vec<Record>> {
        let normalized = rows
            .iter()
            .map(|row| self.header.normalize(row))
            .collect::<DbResult<Vec<_>>>()?;

        self.editor.locked_append(normalized.clone()).await?;
        Ok(normalized)
    }

    /// Applies `patch` to every row matching `predicate`; returns the updated
    /// rows.
    pub async fn edit(&self, predicate: &Record, patch: &Record) -> DbResult<Vec<Record>> {
        self.header.check_record(patch)?;

        let mut updated = Vec::new();
        self.editor
            .locked_edit(|mut row| {
                if is_subset_of(predicate, &row) {
                    row.apply(patch);
                    updated.push(row.clone());
                }
                Some(row)
            })
            .await?;
        Ok(updated)
    }

    /// Removes every row matching `predicate`; returns the removed rows.
    pub async fn delete(&self, predicate: &Record) -> DbResult<Vec<Record>> {
        let mut deleted = Vec::new();
        self.editor
            .locked_edit(|row| {
                if is_subset_of(predicate, &row) {
                    deleted.push(row);
                    None
                } else {
                    Some(row)
                }
            })
            .await?;
        Ok(deleted)
    }
}
