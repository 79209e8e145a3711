//! Database schema definitions.
//!
//! Creation is idempotent (`CREATE ... IF NOT EXISTS`) and runs on every
//! open, so initializing an existing database is a no-op.

use rusqlite::{Connection, Result};

/// Current schema version for migration tracking.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The base SQL schema.
///
/// Timestamps are INTEGER microseconds since the Unix epoch. Open rows carry
/// the `9999-12-31T23:59:59.999999Z` sentinel in `valid_to`.
pub const SCHEMA_SQL: &str = r"
-- ====================
-- Schema Version Tracking
-- ====================

CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

-- ====================
-- Core Tables
-- ====================

-- Employees: identity keyed by phone, never overwritten
CREATE TABLE IF NOT EXISTS employees (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    phone TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL
);

-- Projects: append-only version rows per (employee, project)
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_phone TEXT NOT NULL REFERENCES employees(phone) ON DELETE CASCADE,
    project_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    budget REAL NOT NULL,
    status TEXT NOT NULL,
    valid_from INTEGER NOT NULL,
    valid_to INTEGER NOT NULL DEFAULT 253402300799999999,
    is_current INTEGER NOT NULL DEFAULT 1 CHECK (is_current IN (0, 1)),
    created_at INTEGER NOT NULL,
    UNIQUE (employee_phone, project_id, valid_from),
    CHECK (valid_from < valid_to)
);

CREATE INDEX IF NOT EXISTS idx_projects_employee ON projects(employee_phone, valid_from);
";

/// Apply the schema to a database connection.
///
/// Sets connection pragmas, creates tables, and runs pending migrations.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    conn.execute_batch(SCHEMA_SQL)?;

    super::migrations::run_migrations(conn)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![
            format!("v{CURRENT_SCHEMA_VERSION}"),
            chrono::Utc::now().timestamp_micros()
        ],
    )?;

    Ok(())
}
