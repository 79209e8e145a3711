//! Configuration management.
//!
//! Resolves where the database and the document mirror live. Both follow
//! the same priority: explicit flag, then environment variable, then a
//! per-user location under `~/.empsync/`.
//!
//! The CLI flags read their environment variables through clap, so the env
//! step here only matters for library callers that pass `None`.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable overriding the database path.
pub const DB_ENV: &str = "EMPSYNC_DB";

/// Environment variable overriding the document path.
pub const DOCUMENT_ENV: &str = "EMPSYNC_DOCUMENT";

/// Environment variable that redirects defaults to an isolated test directory.
pub const TEST_MODE_ENV: &str = "EMPSYNC_TEST_DB";

const DB_FILE: &str = "empsync.db";
const DOCUMENT_FILE: &str = "employees.json";

/// Get the global empsync directory (`~/.empsync/`).
#[must_use]
pub fn global_empsync_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".empsync"))
}

/// Check if test mode is enabled.
///
/// Any non-empty value other than `0` or `false` enables it.
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var(TEST_MODE_ENV).is_ok_and(|v| is_truthy(&v))
}

fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}

/// Default data directory: `~/.empsync/data`, or `~/.empsync/test` in test mode.
#[must_use]
pub fn default_data_dir() -> Option<PathBuf> {
    let subdir = if is_test_mode() { "test" } else { "data" };
    global_empsync_dir().map(|dir| dir.join(subdir))
}

fn resolve(explicit: Option<&Path>, env_var: &str, file_name: &str) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(value) = std::env::var(env_var) {
        if !value.trim().is_empty() {
            return Some(PathBuf::from(value));
        }
    }

    default_data_dir().map(|dir| dir.join(file_name))
}

/// Resolve the database path.
///
/// Priority:
/// 1. `explicit_path` (the `--db` flag)
/// 2. `EMPSYNC_DB`
/// 3. `~/.empsync/data/empsync.db`
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    resolve(explicit_path, DB_ENV, DB_FILE)
}

/// Resolve the document mirror path.
///
/// Priority:
/// 1. `explicit_path` (the `--document` flag)
/// 2. `EMPSYNC_DOCUMENT`
/// 3. `~/.empsync/data/employees.json`
#[must_use]
pub fn resolve_document_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    resolve(explicit_path, DOCUMENT_ENV, DOCUMENT_FILE)
}

/// Like [`resolve_db_path`], failing with a config error when no home
/// directory can be determined.
///
/// # Errors
///
/// Returns [`Error::Config`] if no location can be resolved.
pub fn require_db_path(explicit_path: Option<&Path>) -> Result<PathBuf> {
    resolve_db_path(explicit_path)
        .ok_or_else(|| Error::Config("Could not determine database path; pass --db".to_string()))
}

/// Like [`resolve_document_path`], failing with a config error.
///
/// # Errors
///
/// Returns [`Error::Config`] if no location can be resolved.
pub fn require_document_path(explicit_path: Option<&Path>) -> Result<PathBuf> {
    resolve_document_path(explicit_path).ok_or_else(|| {
        Error::Config("Could not determine document path; pass --document".to_string())
    })
}

/// Default history export file: `history.jsonl` beside the database.
#[must_use]
pub fn default_export_path(db_path: &Path) -> PathBuf {
    db_path
        .parent()
        .map_or_else(|| PathBuf::from(crate::sync::HISTORY_FILE), |dir| {
            dir.join(crate::sync::HISTORY_FILE)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_paths_win() {
        let db = PathBuf::from("/custom/path/db.sqlite");
        let doc = PathBuf::from("/custom/path/people.json");
        assert_eq!(resolve_db_path(Some(&db)), Some(db));
        assert_eq!(resolve_document_path(Some(&doc)), Some(doc));
    }

    #[test]
    fn test_default_file_names() {
        let db = resolve(None, "EMPSYNC_UNSET_FOR_TEST", DB_FILE).unwrap();
        let doc = resolve(None, "EMPSYNC_UNSET_FOR_TEST", DOCUMENT_FILE).unwrap();
        assert!(db.ends_with(DB_FILE));
        assert!(doc.ends_with(DOCUMENT_FILE));
        assert_eq!(db.parent(), doc.parent());
    }

    #[test]
    fn test_global_dir_returns_some() {
        let dir = global_empsync_dir().unwrap();
        assert!(dir.ends_with(".empsync"));
    }

    #[test]
    fn test_truthy_parsing() {
        assert!(!is_truthy(""));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy("FALSE"));
        assert!(is_truthy("1"));
        assert!(is_truthy("yes"));
    }

    #[test]
    fn test_default_export_path_sits_beside_db() {
        let path = default_export_path(Path::new("/data/empsync.db"));
        assert_eq!(path, PathBuf::from("/data/history.jsonl"));
    }
}
