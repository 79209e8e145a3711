//! Data models for empsync.
//!
//! This module contains all domain models:
//! - Employee / Project (document view)
//! - EmployeeDocument (the whole mirror)
//! - ProjectVersion (relational, versioned view)

pub mod employee;
pub mod version;

pub use employee::{Employee, EmployeeDocument, Project, ProjectKey, STATUS_COMPLETED, STATUS_ONGOING};
pub use version::{ProjectVersion, VALID_TO_INFINITY_MICROS, from_micros, to_micros, valid_to_infinity};
