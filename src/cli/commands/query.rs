//! Read-only queries: current versions, timelines, assignment edges.

use crate::error::{Error, Result};
use crate::model::{ProjectVersion, VALID_TO_INFINITY_MICROS, to_micros};
use crate::storage::SqliteStorage;
use colored::Colorize;
use std::path::PathBuf;

/// Execute the current command.
///
/// # Errors
///
/// Returns [`Error::EmployeeNotFound`] if the phone has no employee row.
pub fn current(phone: &str, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = super::open_storage(db_path)?;
    require_employee(&storage, phone)?;
    let versions = storage.current_versions(phone)?;
    print_versions(phone, &versions, json)
}

/// Execute the history command.
///
/// # Errors
///
/// Returns [`Error::EmployeeNotFound`] if the phone has no employee row.
pub fn history(phone: &str, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = super::open_storage(db_path)?;
    require_employee(&storage, phone)?;
    let versions = storage.project_history(phone)?;
    print_versions(phone, &versions, json)
}

/// Execute the edges command.
///
/// # Errors
///
/// Returns an error if the database is missing or the query fails.
pub fn edges(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = super::open_storage(db_path)?;
    let edges = storage.assignment_edges()?;

    if json {
        return super::print_json(&edges);
    }

    if edges.is_empty() {
        println!("No assignments.");
        return Ok(());
    }

    for edge in &edges {
        let marker = if edge.is_current { "*".green() } else { " ".normal() };
        println!(
            "{marker} {} → {} [{}]",
            edge.employee_name,
            edge.project_name,
            super::status_label(&edge.status)
        );
    }
    Ok(())
}

fn require_employee(storage: &SqliteStorage, phone: &str) -> Result<()> {
    storage
        .get_employee(phone)?
        .map(|_| ())
        .ok_or_else(|| Error::EmployeeNotFound {
            phone: phone.to_string(),
        })
}

fn print_versions(phone: &str, versions: &[ProjectVersion], json: bool) -> Result<()> {
    if json {
        return super::print_json(&versions);
    }

    if versions.is_empty() {
        println!("No project versions for {phone}.");
        return Ok(());
    }

    for v in versions {
        let until = if to_micros(v.valid_to) == VALID_TO_INFINITY_MICROS {
            "now".to_string()
        } else {
            v.valid_to.to_rfc3339()
        };
        println!(
            "{} {} budget={} [{}]  {} .. {}",
            format!("#{}", v.project_id).dimmed(),
            v.name,
            v.budget,
            super::status_label(&v.status),
            v.valid_from.to_rfc3339(),
            until
        );
    }
    Ok(())
}
