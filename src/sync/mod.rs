//! Dual-store synchronization.
//!
//! Keeps the JSON document mirror and the SQLite history in agreement:
//!
//! - **Writer**: reconcile a batch, commit it to SQLite, then merge the mirror
//! - **Merge**: status rewrite, append and deduplication for the mirror
//! - **File**: atomic document and JSONL writes
//! - **Export**: full history to JSONL with SHA256 content hashes
//!
//! # Example
//!
//! ```ignore
//! use empsync::sync::{DocumentStore, SyncWriter, add_project};
//!
//! let document = DocumentStore::new("employees.json");
//! let mut writer = SyncWriter::new(&mut storage, &document);
//! let report = add_project(&mut writer, "111", None, project)?;
//! ```

mod export;
mod file;
mod hash;
mod merge;
mod types;
mod writer;

pub use export::{HISTORY_FILE, HistoryExporter};
pub use file::{DocumentStore, atomic_write, read_jsonl, to_pretty_json, write_jsonl};
pub use hash::{content_hash, has_changed};
pub use merge::{dedup_projects, merge_projects, retire_all_except};
pub use types::{BatchStats, ExportStats, SyncReport, VersionRecord};
pub use writer::{SyncWriter, add_project, mirror_employee_name};
