//! empsync - employee project history kept in sync between a JSON document
//! and SQLite.
//!
//! The JSON document is a single snapshot per employee. SQLite keeps every
//! version of every project assignment as a slowly changing dimension.
//!
//! # Architecture
//!
//! - [`validate`] - JSON Schema gate for incoming documents
//! - [`reconcile`] - Pure close/open planning over an employee's timeline
//! - [`sync`] - Dual-store writer, mirror merge and history export
//! - [`storage`] - SQLite database layer
//! - [`model`] - Document and version types
//! - [`config`] - Path resolution
//! - [`cli`] - Command-line interface using clap
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod storage;
pub mod sync;
pub mod validate;

pub use error::{Error, Result};
