//! Sync command implementation.
//!
//! Validates a whole batch document up front, then syncs its employees in
//! order, one transaction each.

use crate::error::Result;
use crate::sync::{BatchStats, SyncWriter};
use crate::validate::validate_document;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Execute the sync command.
///
/// # Errors
///
/// Returns a parse or schema error before any store is touched, or the
/// first employee's sync error.
pub fn execute(
    file: &Path,
    dry_run: bool,
    db_path: Option<&PathBuf>,
    document_path: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let raw = fs::read_to_string(file)?;
    let batch = validate_document(&raw)?;

    let mut storage = super::open_storage(db_path)?;
    let document = super::document_store(document_path)?;
    let mut writer = SyncWriter::new(&mut storage, &document);

    let reports = writer.sync_document(&batch, dry_run)?;

    let mut stats = BatchStats::default();
    for report in &reports {
        stats.add(report);
    }
    info!(employees = stats.employees, opened = stats.opened, dry_run, "Batch done");

    if json {
        let output = serde_json::json!({
            "success": true,
            "dry_run": dry_run,
            "stats": stats,
            "reports": reports,
        });
        return super::print_json(&output);
    }

    if reports.is_empty() {
        println!("No employees in {}.", file.display());
        return Ok(());
    }

    for report in &reports {
        super::print_sync_report(report);
    }
    println!();
    println!(
        "  Total: {} employees ({} new), {} versions opened, {} closed",
        stats.employees, stats.employees_created, stats.opened, stats.closed
    );
    Ok(())
}
