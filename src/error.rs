//! Error types for empsync.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=store, 3=not_found, 4=validation, etc.)
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for empsync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Store (exit 2)
    NotInitialized,
    ConnectionError,
    ConstraintViolation,
    DatabaseError,

    // Not Found (exit 3)
    EmployeeNotFound,

    // Validation (exit 4)
    ParseError,
    SchemaError,
    InvalidArgument,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::ConnectionError => "CONNECTION_ERROR",
            Self::ConstraintViolation => "CONSTRAINT_VIOLATION",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::EmployeeNotFound => "EMPLOYEE_NOT_FOUND",
            Self::ParseError => "PARSE_ERROR",
            Self::SchemaError => "SCHEMA_ERROR",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized
            | Self::ConnectionError
            | Self::ConstraintViolation
            | Self::DatabaseError => 2,
            Self::EmployeeNotFound => 3,
            Self::ParseError | Self::SchemaError | Self::InvalidArgument => 4,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether retrying with corrected input can succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ParseError | Self::SchemaError | Self::InvalidArgument | Self::DatabaseError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in empsync operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `empsync init` first")]
    NotInitialized,

    #[error("Invalid JSON: {0}")]
    Parse(String),

    #[error("Schema validation failed: {}", violations.join("; "))]
    Schema { violations: Vec<String> },

    #[error("Cannot open store at {path}: {reason}")]
    Connection { path: PathBuf, reason: String },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Employee not found: {phone}")]
    EmployeeNotFound { phone: String },

    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => {
                Self::ConstraintViolation(err.to_string())
            }
            _ => Self::Database(err),
        }
    }
}

impl Error {
    /// Build a schema error from a single violation message.
    #[must_use]
    pub fn schema(violation: impl Into<String>) -> Self {
        Self::Schema {
            violations: vec![violation.into()],
        }
    }

    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::Parse(_) => ErrorCode::ParseError,
            Self::Schema { .. } => ErrorCode::SchemaError,
            Self::Connection { .. } => ErrorCode::ConnectionError,
            Self::ConstraintViolation(_) => ErrorCode::ConstraintViolation,
            Self::EmployeeNotFound { .. } => ErrorCode::EmployeeNotFound,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => {
                Some("Run `empsync init` to create the database and document".to_string())
            }

            Self::EmployeeNotFound { phone } => Some(format!(
                "No employee with phone '{phone}' in the document. \
                 Add them with `empsync sync <batch.json>` first."
            )),

            Self::Schema { .. } => Some(
                "Expected {\"employees\": [{\"name\", \"phone\", \"projects\": \
                 [{\"id\": int, \"name\", \"budget\": number, \"status\"}]}]}"
                    .to_string(),
            ),

            Self::ConstraintViolation(_) => Some(
                "The transaction was rolled back and the document was left untouched."
                    .to_string(),
            ),

            Self::Connection { path, .. } => Some(format!(
                "Check that {} is writable, or pass --db <path>.",
                path.display()
            )),

            Self::Parse(_)
            | Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
