//! Validate command implementation.

use crate::error::Result;
use crate::validate::validate_document;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Serialize)]
struct ValidateOutput<'a> {
    valid: bool,
    file: &'a Path,
    employees: usize,
    projects: usize,
}

/// Execute the validate command.
///
/// Invalid input surfaces as the parse or schema error, so the exit code
/// tells the two apart.
///
/// # Errors
///
/// Returns [`crate::Error::Parse`] or [`crate::Error::Schema`] if the file is
/// invalid, or an I/O error if it cannot be read.
pub fn execute(file: &Path, json: bool) -> Result<()> {
    let raw = fs::read_to_string(file)?;
    let doc = validate_document(&raw)?;

    let output = ValidateOutput {
        valid: true,
        file,
        employees: doc.employees.len(),
        projects: doc.project_count(),
    };

    if json {
        return super::print_json(&output);
    }

    println!(
        "{} is valid: {} employees, {} projects",
        file.display(),
        output.employees,
        output.projects
    );
    Ok(())
}
