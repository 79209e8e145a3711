//! Command implementations.

pub mod add;
pub mod completions;
pub mod export;
pub mod init;
pub mod query;
pub mod sync;
pub mod validate;
pub mod version;

use crate::config::{require_db_path, require_document_path};
use crate::error::{Error, Result};
use crate::model::{STATUS_COMPLETED, STATUS_ONGOING};
use crate::storage::SqliteStorage;
use crate::sync::{DocumentStore, SyncReport};
use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::path::PathBuf;

/// Open the existing database; a missing file means `init` never ran.
pub(crate) fn open_storage(db_path: Option<&PathBuf>) -> Result<SqliteStorage> {
    let db_path = require_db_path(db_path.map(PathBuf::as_path))?;
    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }
    SqliteStorage::open(&db_path)
}

pub(crate) fn document_store(document_path: Option<&PathBuf>) -> Result<DocumentStore> {
    require_document_path(document_path.map(PathBuf::as_path)).map(DocumentStore::new)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

pub(crate) fn status_label(status: &str) -> ColoredString {
    match status {
        STATUS_ONGOING => status.green(),
        STATUS_COMPLETED => status.dimmed(),
        other => other.yellow(),
    }
}

/// Human-readable summary of one employee sync.
pub(crate) fn print_sync_report(report: &SyncReport) {
    let verb = if report.applied { "Synced" } else { "Would sync" };
    let created = if report.employee_created { " (new employee)" } else { "" };
    println!("{verb} {}{created}", report.phone.bold());
    println!(
        "  {} inserted, {} updated | {} opened, {} closed, {} retired",
        report.inserted, report.updated, report.opened, report.closed, report.retired
    );
    for project in &report.mirror_projects {
        println!(
            "  {} {} budget={} [{}]",
            format!("#{}", project.id).dimmed(),
            project.name,
            project.budget,
            status_label(&project.status)
        );
    }
}
