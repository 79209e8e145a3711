//! History export to JSONL.
//!
//! Writes every version row of every employee to one JSONL file, ordered by
//! phone then `valid_from`. The file is a snapshot: each export overwrites
//! it atomically. When a previous export exists, its content hashes are used
//! to count how many rows are new or changed.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use chrono::Utc;
use tracing::info;

use crate::error::Result;
use crate::storage::SqliteStorage;
use crate::sync::file::{read_jsonl, write_jsonl};
use crate::sync::hash::{content_hash, has_changed};
use crate::sync::types::{ExportStats, VersionRecord};

/// Default file name for the history export.
pub const HISTORY_FILE: &str = "history.jsonl";

/// Exporter for the relational timeline.
pub struct HistoryExporter<'a> {
    storage: &'a SqliteStorage,
    output: PathBuf,
}

impl<'a> HistoryExporter<'a> {
    #[must_use]
    pub fn new(storage: &'a SqliteStorage, output: PathBuf) -> Self {
        Self { storage, output }
    }

    /// Export all versions, overwriting the output file.
    ///
    /// # Errors
    ///
    /// Returns an error if the query, a previous export, or the write fails.
    pub fn export(&self) -> Result<ExportStats> {
        let previous = self.previous_hashes()?;
        let versions = self.storage.all_versions()?;
        let exported_at = Utc::now().to_rfc3339();

        let mut stats = ExportStats::default();
        let mut phones = HashSet::new();
        let mut records = Vec::with_capacity(versions.len());

        for version in versions {
            let hash = content_hash(&version)?;
            if has_changed(&hash, previous.get(&version.row_id).map(String::as_str)) {
                stats.changed += 1;
            }
            if version.is_current {
                stats.current += 1;
            }
            phones.insert(version.employee_phone.clone());
            records.push(VersionRecord {
                data: version,
                content_hash: hash,
                exported_at: exported_at.clone(),
            });
        }

        stats.employees = phones.len();
        stats.versions = records.len();

        write_jsonl(&self.output, &records)?;
        info!(
            path = %self.output.display(),
            versions = stats.versions,
            changed = stats.changed,
            "Exported history"
        );

        Ok(stats)
    }

    fn previous_hashes(&self) -> Result<HashMap<i64, String>> {
        if !self.output.exists() {
            return Ok(HashMap::new());
        }
        let records: Vec<VersionRecord> = read_jsonl(&self.output)?;
        Ok(records
            .into_iter()
            .map(|r| (r.data.row_id, r.content_hash))
            .collect())
    }
}
