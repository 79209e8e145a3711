//! Export command implementation.

use crate::config::{default_export_path, require_db_path};
use crate::error::Result;
use crate::sync::HistoryExporter;
use std::path::PathBuf;

/// Execute the export command.
///
/// # Errors
///
/// Returns an error if the database is missing or the export fails.
pub fn execute(output: Option<&PathBuf>, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = super::open_storage(db_path)?;
    let output = match output {
        Some(path) => path.clone(),
        None => default_export_path(&require_db_path(db_path.map(PathBuf::as_path))?),
    };

    let stats = HistoryExporter::new(&storage, output.clone()).export()?;

    if json {
        let payload = serde_json::json!({
            "success": true,
            "output": output.display().to_string(),
            "stats": stats,
        });
        return super::print_json(&payload);
    }

    if stats.is_empty() {
        println!("No history to export.");
        return Ok(());
    }

    println!("Export complete");
    println!("  Employees: {}", stats.employees);
    println!("  Versions:  {} ({} current, {} changed)", stats.versions, stats.current, stats.changed);
    println!("  Location:  {}", output.display());
    Ok(())
}
