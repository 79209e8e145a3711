//! Initialize the database and the document mirror.
//!
//! Idempotent: the schema is create-if-not-exists and an existing document
//! is never overwritten, so running `init` twice is harmless.

use crate::config::{require_db_path, require_document_path};
use crate::error::Result;
use crate::storage::SqliteStorage;
use crate::sync::DocumentStore;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    document: PathBuf,
    document_created: bool,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if a directory, the database or the document cannot be
/// created.
pub fn execute(db_path: Option<&PathBuf>, document_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let db_path = require_db_path(db_path.map(PathBuf::as_path))?;
    let document_path = require_document_path(document_path.map(PathBuf::as_path))?;

    create_parent(&db_path)?;
    SqliteStorage::open(&db_path)?;
    let document_created = DocumentStore::new(&document_path).init_empty()?;

    if json {
        return super::print_json(&InitOutput {
            database: db_path,
            document: document_path,
            document_created,
        });
    }

    println!("Initialized empsync");
    println!("  Database: {}", db_path.display());
    if document_created {
        println!("  Document: {} (created)", document_path.display());
    } else {
        println!("  Document: {} (existing, kept)", document_path.display());
    }
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
