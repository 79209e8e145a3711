//! SQLite storage implementation.
//!
//! `SqliteStorage` is the explicit store handle threaded through every
//! operation. Writes go through [`SqliteStorage::mutate`], which wraps the
//! closure in one IMMEDIATE transaction: commit on `Ok`, rollback on `Err`.
//!
//! Read helpers are free functions over `&Connection` so they work both on
//! the handle and inside an open transaction.

use crate::error::{Error, Result};
use crate::model::{ProjectVersion, STATUS_COMPLETED, from_micros, to_micros};
use crate::reconcile::{HistoryOp, ReconcilePlan};
use crate::storage::schema::apply_schema;
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSqlError, Type};
use rusqlite::{Connection, OptionalExtension, Transaction};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

/// An employee row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeRow {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

/// One employee → project edge, as read for display consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentEdge {
    pub employee_name: String,
    pub project_name: String,
    pub status: String,
    pub is_current: bool,
}

const VERSION_COLUMNS: &str =
    "id, employee_phone, project_id, name, budget, status, valid_from, valid_to, is_current";

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the file cannot be opened, or a
    /// database error if the schema fails to apply.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let connection_error = |e: rusqlite::Error| Error::Connection {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let conn = Connection::open(path).map_err(connection_error)?;

        let timeout = timeout_ms.map_or(Duration::from_secs(5), Duration::from_millis);
        conn.busy_timeout(timeout).map_err(connection_error)?;

        apply_schema(&conn)?;
        debug!(path = %path.display(), "Opened store");

        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::Connection {
            path: PathBuf::from(":memory:"),
            reason: e.to_string(),
        })?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection (for read operations).
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Execute a mutation inside one transaction.
    ///
    /// Begins an IMMEDIATE transaction, runs `f`, and commits. If `f` or the
    /// commit fails, the transaction is dropped and SQLite rolls it back.
    ///
    /// # Errors
    ///
    /// Returns the closure's error or the commit error.
    pub fn mutate<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let result = match f(&tx) {
            Ok(result) => result,
            Err(e) => {
                warn!(op, error = %e, "Rolling back transaction");
                return Err(e);
            }
        };

        tx.commit()?;
        debug!(op, "Committed transaction");

        Ok(result)
    }

    // ===================
    // Employee Operations
    // ===================

    /// Insert an employee if the phone is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn ensure_employee(&mut self, name: &str, phone: &str) -> Result<bool> {
        let now = Utc::now();
        self.mutate("ensure_employee", |tx| ensure_employee(tx, name, phone, now))
    }

    /// Get an employee by phone.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_employee(&self, phone: &str) -> Result<Option<EmployeeRow>> {
        let employee = self
            .conn
            .query_row(
                "SELECT id, name, phone, created_at FROM employees WHERE phone = ?1",
                [phone],
                map_employee_row,
            )
            .optional()?;
        Ok(employee)
    }

    /// List all employees in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_employees(&self) -> Result<Vec<EmployeeRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, phone, created_at FROM employees ORDER BY id")?;
        let rows = stmt
            .query_map([], map_employee_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ==================
    // Version Operations
    // ==================

    /// Full timeline of an employee, ordered by `valid_from`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn project_history(&self, phone: &str) -> Result<Vec<ProjectVersion>> {
        project_history(&self.conn, phone)
    }

    /// Open versions of an employee, ordered by project id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn current_versions(&self, phone: &str) -> Result<Vec<ProjectVersion>> {
        let sql = format!(
            "SELECT {VERSION_COLUMNS} FROM projects
             WHERE employee_phone = ?1 AND is_current = 1
             ORDER BY project_id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([phone], map_version_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Every version row of every employee, ordered by phone then time.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn all_versions(&self) -> Result<Vec<ProjectVersion>> {
        let sql = format!(
            "SELECT {VERSION_COLUMNS} FROM projects ORDER BY employee_phone, valid_from, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], map_version_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Employee → project edges across all versions.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn assignment_edges(&self) -> Result<Vec<AssignmentEdge>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.name, p.name, p.status, p.is_current
             FROM employees e
             JOIN projects p ON e.phone = p.employee_phone
             ORDER BY e.id, p.valid_from, p.id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(AssignmentEdge {
                    employee_name: row.get(0)?,
                    project_name: row.get(1)?,
                    status: row.get(2)?,
                    is_current: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

/// Insert-if-absent keyed by phone; an existing row is never overwritten.
///
/// Returns `true` if a new employee was created.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn ensure_employee(
    conn: &Connection,
    name: &str,
    phone: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT INTO employees (name, phone, created_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(phone) DO NOTHING",
        rusqlite::params![name, phone, to_micros(now)],
    )?;
    Ok(inserted == 1)
}

/// Full timeline of an employee, ordered by `valid_from`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn project_history(conn: &Connection, phone: &str) -> Result<Vec<ProjectVersion>> {
    let sql = format!(
        "SELECT {VERSION_COLUMNS} FROM projects
         WHERE employee_phone = ?1
         ORDER BY valid_from, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([phone], map_version_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Apply a reconciliation plan's operations in order.
///
/// Must run inside the caller's transaction; any failure aborts the whole
/// plan when that transaction rolls back.
///
/// # Errors
///
/// Returns [`Error::ConstraintViolation`] if a write breaks a uniqueness or
/// foreign-key constraint, or if a row to close is no longer current.
pub fn apply_plan(conn: &Connection, plan: &ReconcilePlan, now: DateTime<Utc>) -> Result<()> {
    for op in &plan.ops {
        match op {
            HistoryOp::Close {
                project_id,
                valid_from,
                closed_at,
                retire,
            } => {
                let changed = conn.execute(
                    "UPDATE projects
                     SET valid_to = ?1,
                         is_current = 0,
                         status = CASE WHEN ?2 THEN ?6 ELSE status END
                     WHERE employee_phone = ?3 AND project_id = ?4 AND valid_from = ?5
                       AND is_current = 1",
                    rusqlite::params![
                        to_micros(*closed_at),
                        retire,
                        plan.phone,
                        project_id,
                        to_micros(*valid_from),
                        STATUS_COMPLETED
                    ],
                )?;
                if changed != 1 {
                    return Err(Error::ConstraintViolation(format!(
                        "version of project {project_id} for {} starting {valid_from} is no longer current",
                        plan.phone
                    )));
                }
            }
            HistoryOp::Open(version) => {
                conn.execute(
                    "INSERT INTO projects (employee_phone, project_id, name, budget, status,
                                           valid_from, valid_to, is_current, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)",
                    rusqlite::params![
                        version.employee_phone,
                        version.project_id,
                        version.name,
                        version.budget,
                        version.status,
                        to_micros(version.valid_from),
                        to_micros(version.valid_to),
                        to_micros(now)
                    ],
                )?;
            }
        }
    }
    Ok(())
}

fn timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let micros: i64 = row.get(idx)?;
    from_micros(micros).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            Box::new(FromSqlError::OutOfRange(micros)),
        )
    })
}

fn map_employee_row(row: &rusqlite::Row) -> rusqlite::Result<EmployeeRow> {
    Ok(EmployeeRow {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        created_at: timestamp(row, 3)?,
    })
}

fn map_version_row(row: &rusqlite::Row) -> rusqlite::Result<ProjectVersion> {
    Ok(ProjectVersion {
        row_id: row.get(0)?,
        employee_phone: row.get(1)?,
        project_id: row.get(2)?,
        name: row.get(3)?,
        budget: row.get(4)?,
        status: row.get(5)?,
        valid_from: timestamp(row, 6)?,
        valid_to: timestamp(row, 7)?,
        is_current: row.get(8)?,
    })
}
