//! Crawl checkpoint persistence.
//!
//! The checkpoint is an opaque JSON blob owned by the crawler. It is replaced
//! atomically on every save, so a killed process leaves either the previous or
//! the new snapshot on disk, never a partial one.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{atomic_write, StorageError};

/// Snapshot of crawl progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Identifiers already fetched or permanently skipped, sorted
    pub visited: Vec<String>,

    /// Pages successfully collected so far
    pub collected: usize,

    /// Pending identifiers in visit order
    pub frontier: Vec<String>,

    /// Identifier to fetch first on resume; `None` once the frontier is exhausted
    pub next_link: Option<String>,

    pub saved_at: DateTime<Utc>,
}

/// Reads and writes the checkpoint file.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the checkpoint, or `None` if none has been written yet.
    ///
    /// A checkpoint that exists but cannot be decoded is an error: silently
    /// starting over would re-fetch everything already collected.
    pub fn load(&self) -> Result<Option<Checkpoint>, StorageError> {
        if !self.path.exists() {
            debug!("No checkpoint at {:?}", self.path);
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)?;
        let checkpoint: Checkpoint = serde_json::from_str(&contents)?;
        Ok(Some(checkpoint))
    }

    pub fn save(&self, checkpoint: &Checkpoint) -> Result<(), StorageError> {
        let json = serde_json::to_vec(checkpoint)?;
        atomic_write(&self.path, &json)?;

        info!(
            "Checkpoint saved: {} pages collected, {} visited, {} pending",
            checkpoint.collected,
            checkpoint.visited.len(),
            checkpoint.frontier.len()
        );
        Ok(())
    }
}
