//! Add command implementation.

use crate::cli::AddArgs;
use crate::error::Result;
use crate::model::Project;
use crate::sync::{SyncWriter, add_project, mirror_employee_name};
use crate::validate::validate_project;
use std::path::PathBuf;

/// Execute the add command.
///
/// The project is checked against the same schema as document input, so a
/// non-finite budget is rejected before any store is opened.
///
/// # Errors
///
/// Returns a validation error, [`crate::Error::NotInitialized`],
/// [`crate::Error::EmployeeNotFound`], or any sync error.
pub fn execute(
    args: &AddArgs,
    db_path: Option<&PathBuf>,
    document_path: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let project = validate_project(serde_json::to_value(Project::new(
        args.id,
        args.name.clone(),
        args.budget,
        args.status.clone(),
    ))?)?;

    let mut storage = super::open_storage(db_path)?;
    let document = super::document_store(document_path)?;
    let mut writer = SyncWriter::new(&mut storage, &document);

    let report = if args.dry_run {
        let name = mirror_employee_name(&document, &args.phone)?;
        writer.preview(&name, &args.phone, &[project])?
    } else {
        add_project(&mut writer, &args.phone, args.target_status.as_deref(), project)?
    };

    if json {
        return super::print_json(&report);
    }

    super::print_sync_report(&report);
    Ok(())
}
