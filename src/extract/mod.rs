//! Fact extraction over a directory of stored pages.
//!
//! Every stored page is parsed and run through the infobox parser. Pages with
//! a fact box produce one JSON record named after the fact box title, so two
//! pages whose boxes share a title overwrite each other (last in filename
//! order wins). Unreadable pages are reported and skipped.

pub mod infobox;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::document::Document;
use crate::storage::{PageStore, RecordStore, StorageError};

pub use infobox::{parse_fact_box, FactBox, FactFields, FactValue};

/// Errors that stop an extraction run.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Input directory not found: {0}")]
    PathNotFound(PathBuf),
}

/// What happened to one stored page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub title: Option<String>,
    pub has_fact_box: bool,
    pub fields: Option<FactFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutcome {
    fn parsed(fact_box: Option<FactBox>) -> Self {
        match fact_box {
            Some(FactBox { title, fields }) => Self {
                title: Some(title),
                has_fact_box: true,
                fields: Some(fields),
                error: None,
            },
            None => Self {
                title: None,
                has_fact_box: false,
                fields: None,
                error: None,
            },
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            title: None,
            has_fact_box: false,
            fields: None,
            error: Some(error.into()),
        }
    }

    /// Title and fields, when this outcome should produce a record.
    pub fn record(&self) -> Option<(&str, &FactFields)> {
        if !self.has_fact_box {
            return None;
        }
        match (&self.title, &self.fields) {
            (Some(title), Some(fields)) if !fields.is_empty() => Some((title.as_str(), fields)),
            _ => None,
        }
    }
}

/// Result of an extraction run.
#[derive(Debug, Clone)]
pub struct ExtractSummary {
    /// Outcome per stored page file name
    pub outcomes: BTreeMap<String, FileOutcome>,
    /// Record files written
    pub written: Vec<PathBuf>,
}

impl ExtractSummary {
    pub fn records_written(&self) -> usize {
        self.written.len()
    }

    pub fn errors(&self) -> usize {
        self.outcomes.values().filter(|o| o.error.is_some()).count()
    }
}

/// Scans stored pages and writes fact records.
pub struct FactExtractor {
    pages: PageStore,
    records: RecordStore,
}

impl FactExtractor {
    pub fn new(pages: PageStore, records: RecordStore) -> Self {
        Self { pages, records }
    }

    /// Parse every stored page, keyed by file name.
    pub fn scan(&self) -> Result<BTreeMap<String, FileOutcome>, ExtractError> {
        let files = self.pages.list().map_err(|e| match e {
            StorageError::PathNotFound(path) => ExtractError::PathNotFound(path),
            other => ExtractError::Storage(other),
        })?;

        let mut outcomes = BTreeMap::new();
        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let outcome = match read_page(&path) {
                Ok(markup) => FileOutcome::parsed(parse_fact_box(&Document::parse(&markup))),
                Err(e) => {
                    warn!("Failed to process {}: {}", name, e);
                    FileOutcome::failed(e)
                }
            };
            debug!("{}: fact box = {}", name, outcome.has_fact_box);
            outcomes.insert(name, outcome);
        }

        Ok(outcomes)
    }

    /// Scan the pages directory and write one record per fact box.
    pub fn run(&self) -> Result<ExtractSummary, ExtractError> {
        info!("Extracting fact boxes from {:?}", self.pages.dir());

        let outcomes = self.scan()?;
        let mut written = Vec::new();

        for (name, outcome) in &outcomes {
            let Some((title, fields)) = outcome.record() else {
                continue;
            };
            let path = self.records.save(title, fields)?;
            debug!("{} -> {:?}", name, path);
            written.push(path);
        }

        let summary = ExtractSummary { outcomes, written };
        info!(
            "Extraction finished: {} pages, {} fact boxes, {} errors",
            summary.outcomes.len(),
            summary.records_written(),
            summary.errors()
        );
        Ok(summary)
    }
}

fn read_page(path: &Path) -> Result<String, String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| format!("invalid UTF-8: {}", e))
}

/// Write per-file outcomes as a JSON report.
pub fn write_report(
    path: &Path,
    outcomes: &BTreeMap<String, FileOutcome>,
) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(outcomes)?;
    fs::write(path, json)?;
    info!("Extraction report written to {}", path.display());
    Ok(())
}
