//! Error types for troopline.
//!
//! This module defines all error types used throughout the troopline crate.
//! Storage faults are wrapped, not translated; "not found" on reads and
//! deletes is modeled with `Option`/`bool` and never reaches this type.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for troopline operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Record Errors ===
    /// An update or removal targeted a row that is not in the store.
    #[error("{entity} {id} does not exist")]
    RecordMissing {
        /// Entity kind (`soldier` or `position`).
        entity: &'static str,
        /// The identifier that matched no row.
        id: i64,
    },

    /// An update was requested for a record that has no identifier yet.
    #[error("{entity} has no identifier; add it before updating")]
    UnsavedRecord {
        /// Entity kind (`soldier` or `position`).
        entity: &'static str,
    },

    /// A stored timestamp could not be parsed.
    #[error("invalid timestamp: {value}")]
    InvalidTimestamp {
        /// The offending value.
        value: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for troopline operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a record missing error.
    #[must_use]
    pub fn record_missing(entity: &'static str, id: i64) -> Self {
        Self::RecordMissing { entity, id }
    }

    /// Check if this error is a missing update/removal target.
    #[must_use]
    pub fn is_record_missing(&self) -> bool {
        matches!(self, Self::RecordMissing { .. })
    }

    /// Check if the store rejected a write because of a constraint
    /// (foreign key, not-null, and so on).
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::DatabaseQuery(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}
