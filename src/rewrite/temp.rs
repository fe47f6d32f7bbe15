//! Temporary replacement files
//!
//! One per mutating operation, created at a collision-free path in the
//! scratch directory and removed when the handle drops, on success and on
//! every early return. Only a process crash can orphan one.

use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::errors::{DbError, DbResult};

/// Scoped ownership of one replacement file
pub struct TempReplacement {
    path: TempPath,
}

impl TempReplacement {
    /// Creates an empty replacement file in `scratch_dir` and returns it with
    /// an open handle positioned at the start.
    pub fn create(scratch_dir: &Path) -> DbResult<(Self, tokio::fs::File)> {
        let temp = tempfile::Builder::new()
            .prefix(".csvdb-")
            .suffix(".csv.tmp")
            .tempfile_in(scratch_dir)
            .map_err(|e| {
                DbError::io_error(
                    format!(
                        "Failed to create replacement file in {}",
                        scratch_dir.display()
                    ),
                    e,
                )
            })?;

        let (file, path) = temp.into_parts();
        Ok((Self { path }, tokio::fs::File::from_std(file)))
    }

    /// Location of the replacement file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the file now, reporting failure instead of ignoring it.
    pub fn discard(self) -> DbResult<()> {
        let display: PathBuf = self.path.to_path_buf();
        self.path.close().map_err(|e| {
            DbError::io_error(
                format!("Failed to remove replacement file: {}", display.display()),
                e,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let (temp, _file) = TempReplacement::create(dir.path()).unwrap();
        let path = temp.path().to_path_buf();
        assert!(path.exists());
        assert!(path.starts_with(dir.path()));

        drop(temp);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_paths_are_unique() {
        let dir = TempDir::new().unwrap();
        let (a, _fa) = TempReplacement::create(dir.path()).unwrap();
        let (b, _fb) = TempReplacement::create(dir.path()).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn test_discard_removes_file() {
        let dir = TempDir::new().unwrap();
        let (temp, file) = TempReplacement::create(dir.path()).unwrap();
        drop(file);
        let path = temp.path().to_path_buf();
        temp.discard().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_scratch_dir_is_io_error() {
        let err = TempReplacement::create(Path::new("/nonexistent/scratch"))
            .err()
            .unwrap();
        assert_eq!(err.code(), crate::errors::DbErrorCode::IoError);
    }
}
