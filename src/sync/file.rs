//! Document and JSONL file operations.
//!
//! Every write is a full rewrite made atomic the same way:
//! write to a temp file beside the target, fsync, then rename over it.
//! A crash mid-write leaves the previous file intact.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::EmployeeDocument;
use crate::validate::validate_document;

/// Write content to a file atomically.
///
/// If any step fails, the original file (if any) remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let mut temp_name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Serialize a value as JSON indented with four spaces.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    String::from_utf8(buf).map_err(|e| Error::Other(e.to_string()))
}

/// Write records to a JSONL file atomically, one JSON object per line.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut content = String::new();
    for record in records {
        content.push_str(&serde_json::to_string(record)?);
        content.push('\n');
    }
    atomic_write(path, &content)
}

/// Read all records from a JSONL file. Blank lines are skipped.
///
/// # Errors
///
/// Returns [`Error::Parse`] naming the 1-indexed line of the first invalid
/// record, or an I/O error.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .map_err(|e| Error::Parse(format!("line {}: {e}", line_num + 1)))?;
        records.push(record);
    }

    Ok(records)
}

/// The JSON document mirror on disk.
///
/// The file is always read fully and validated, and always rewritten fully.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load and validate the document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if the file is missing,
    /// [`Error::Parse`] / [`Error::Schema`] if it is invalid.
    pub fn load(&self) -> Result<EmployeeDocument> {
        if !self.exists() {
            return Err(Error::NotInitialized);
        }
        let raw = fs::read_to_string(&self.path)?;
        let doc = validate_document(&raw)?;
        debug!(path = %self.path.display(), employees = doc.employees.len(), "Loaded document");
        Ok(doc)
    }

    /// Rewrite the whole document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, doc: &EmployeeDocument) -> Result<()> {
        atomic_write(&self.path, &to_pretty_json(doc)?)?;
        debug!(path = %self.path.display(), employees = doc.employees.len(), "Saved document");
        Ok(())
    }

    /// Create an empty document if none exists. Returns `true` if created.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn init_empty(&self) -> Result<bool> {
        if self.exists() {
            return Ok(false);
        }
        self.save(&EmployeeDocument::default())?;
        Ok(true)
    }
}
