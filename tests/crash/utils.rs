//! Crash testing utilities
//!
//! A `TestTable` is a table file plus a config file pointing the scratch
//! directory somewhere inspectable and shortening lock waits.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub struct TestTable {
    _dir: TempDir,
    pub file: PathBuf,
    pub config: PathBuf,
    pub scratch: PathBuf,
}

impl TestTable {
    /// Creates a table file with the given content
    pub fn new(content: &str) -> Self {
        Self::build(content, false)
    }

    /// Like [`TestTable::new`], with held locks released on SIGINT/SIGTERM
    pub fn releasing_on_signal(content: &str) -> Self {
        Self::build(content, true)
    }

    fn build(content: &str, release_on_signal: bool) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let file = dir.path().join("users.csv");
        let scratch = dir.path().join("scratch");
        let config = dir.path().join("csvdb.json");

        fs::create_dir(&scratch).expect("Failed to create scratch dir");
        fs::write(&file, content).expect("Failed to write table");

        let json = serde_json::json!({
            "temp_dir": scratch,
            "lock": {
                "retries": 200,
                "factor": 1.5,
                "min_timeout_ms": 1,
                "max_timeout_ms": 25,
                "release_on_signal": release_on_signal
            }
        });
        fs::write(&config, json.to_string()).expect("Failed to write config");

        Self {
            _dir: dir,
            file,
            config,
            scratch,
        }
    }

    /// Arguments selecting this table's config and file for a command
    pub fn args<'a>(&'a self, command: &'a str, rest: &[&'a str]) -> Vec<&'a str> {
        let mut args = vec![
            "--config",
            path_str(&self.config),
            command,
            "--file",
            path_str(&self.file),
        ];
        args.extend_from_slice(rest);
        args
    }

    pub fn content(&self) -> String {
        fs::read_to_string(&self.file).expect("Failed to read table")
    }

    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.file.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        self.file.with_file_name(name)
    }

    pub fn lock_exists(&self) -> bool {
        self.lock_path().exists()
    }

    /// Files left in the scratch directory
    pub fn scratch_files(&self) -> Vec<PathBuf> {
        fs::read_dir(&self.scratch)
            .expect("Failed to read scratch dir")
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect()
    }
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("Temp paths are UTF-8")
}
