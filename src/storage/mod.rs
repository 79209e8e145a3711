//! SQLite storage layer.
//!
//! - WAL mode and enforced foreign keys
//! - One IMMEDIATE transaction per mutation
//! - Append-only project versions with a single current row per lineage
//!
//! # Submodules
//!
//! - [`schema`] - Database schema definitions
//! - [`migrations`] - Embedded incremental migrations
//! - [`sqlite`] - Main SQLite storage implementation

pub mod migrations;
pub mod schema;
pub mod sqlite;

pub use sqlite::{AssignmentEdge, EmployeeRow, SqliteStorage};
