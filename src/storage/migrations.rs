//! Database migrations embedded at compile time.
//!
//! The SQL lives in `/migrations/` at the repo root and is pulled in with
//! `include_str!`, so no migration files are read at runtime.

use rusqlite::{Connection, Result};
use tracing::info;

/// A single migration with version identifier and SQL content.
struct Migration {
    version: &'static str,
    sql: &'static str,
}

/// All migrations in order, embedded at compile time.
///
/// Version names match the SQL filenames (without .sql extension).
/// The `schema_migrations` table tracks which have been applied.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001_single_current_version",
        sql: include_str!("../../migrations/001_single_current_version.sql"),
    },
    Migration {
        version: "002_current_lookup_index",
        sql: include_str!("../../migrations/002_current_lookup_index.sql"),
    },
];

/// Run all pending migrations on the database.
///
/// Applied in order; versions already in `schema_migrations` are skipped,
/// so calling this on every open is a no-op once the database is current.
///
/// # Errors
///
/// Returns an error if a migration fails to apply.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let applied: std::collections::HashSet<String> = conn
        .prepare("SELECT version FROM schema_migrations")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    for migration in MIGRATIONS {
        if applied.contains(migration.version) {
            continue;
        }

        info!(version = migration.version, "Applying migration");

        conn.execute_batch(migration.sql)?;

        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![migration.version, chrono::Utc::now().timestamp_micros()],
        )?;

        info!(version = migration.version, "Migration complete");
    }

    Ok(())
}
