//! Filesystem storage operations.
//!
//! Handles reading and writing to the local data directory:
//! - Raw page markup (one file per fetched page)
//! - Fact records (one JSON file per extracted fact box)
//! - Crawl checkpoint state

pub mod checkpoint;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

pub use checkpoint::{Checkpoint, CheckpointStore};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Configuration for storage paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub data_dir: PathBuf,

    /// Where raw pages are written (crawl output, extract input)
    pub pages_dir: PathBuf,

    /// Where fact records are written
    pub records_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            pages_dir: data_dir.join("html"),
            records_dir: data_dir.join("json"),
            data_dir,
        }
    }

    pub fn state_dir(&self) -> PathBuf {
        self.data_dir.join("state")
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.state_dir().join("crawl_checkpoint.json")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

fn invalid_filename_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("static pattern is valid"))
}

/// Replace characters that are invalid in file names with `_`.
pub fn sanitize_filename(name: &str) -> String {
    invalid_filename_chars().replace_all(name, "_").into_owned()
}

/// Write a file via temp file + fsync + rename so readers never see a torn write.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StorageError::InvalidPath(path.display().to_string()))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()));
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Raw page store: one file per fetched page, named after the page title.
#[derive(Debug, Clone)]
pub struct PageStore {
    dir: PathBuf,
    extension: String,
}

impl PageStore {
    pub fn new(dir: PathBuf, extension: impl Into<String>) -> Self {
        Self {
            dir,
            extension: extension.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a page with this title is stored under.
    pub fn path_for(&self, title: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", sanitize_filename(title), self.extension))
    }

    /// Persist a page's raw markup. Existing files with the same title are overwritten.
    pub fn save(&self, title: &str, body: &str) -> Result<PathBuf, StorageError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(title);
        fs::write(&path, body)?;

        info!("Page saved: {}", path.display());
        Ok(path)
    }

    /// List stored page files in sorted filename order.
    pub fn list(&self) -> Result<Vec<PathBuf>, StorageError> {
        if !self.dir.exists() {
            return Err(StorageError::PathNotFound(self.dir.clone()));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str()) {
                files.push(path);
            }
        }

        files.sort();
        debug!("Found {} stored pages in {:?}", files.len(), self.dir);
        Ok(files)
    }
}

/// Structured record store: one pretty-printed JSON file per record.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_filename(name)))
    }

    /// Write a record named `name`, replacing any previous record of that name.
    pub fn save<T: Serialize + ?Sized>(&self, name: &str, record: &T) -> Result<PathBuf, StorageError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(name);
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json)?;

        debug!("Record written to {:?}", path);
        Ok(path)
    }
}
