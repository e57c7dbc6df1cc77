//! Error types for rollcall.
//!
//! This module defines all error types used throughout the rollcall crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for rollcall operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Ledger Errors ===
    /// The submitted identity was empty or otherwise unusable.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of what was wrong with the input.
        message: String,
    },

    /// The student already has an attendance record for this date.
    #[error("{name} already checked in on {date}")]
    Duplicate {
        /// Date of the existing record.
        date: NaiveDate,
        /// Student identity of the existing record.
        name: String,
    },

    // === Storage Errors ===
    /// The persisted table exists but could not be read.
    #[error("failed to read attendance table at {path}: {source}")]
    StoreRead {
        /// Path to the table file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The persisted table could not be written.
    #[error("failed to write attendance table at {path}: {source}")]
    StoreWrite {
        /// Path to the table file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The persisted table does not match the expected schema.
    #[error("malformed attendance table at line {line}: {message}")]
    MalformedTable {
        /// 1-based line number of the offending row.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// The store rejected a record because `(date, name)` is already taken.
    #[error("store already holds an entry for {name} on {date}")]
    Conflict {
        /// Date of the conflicting record.
        date: NaiveDate,
        /// Student identity of the conflicting record.
        name: String,
    },

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

    // === Gate Errors ===
    /// The caller's public address could not be resolved.
    #[error("origin lookup failed: {message}")]
    OriginLookup {
        /// Description of what went wrong.
        message: String,
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
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for rollcall operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new malformed table error.
    #[must_use]
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedTable {
            line,
            message: message.into(),
        }
    }

    /// Create a new origin lookup error.
    #[must_use]
    pub fn origin_lookup(message: impl Into<String>) -> Self {
        Self::OriginLookup {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is a per-day uniqueness violation.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Check if this error is a rejected submission input.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    /// Check if this error means the persisted table could not be used.
    ///
    /// These failures are never recovered locally: the whole operation fails
    /// and the table on disk is left as it was.
    #[must_use]
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            Self::StoreRead { .. }
                | Self::StoreWrite { .. }
                | Self::MalformedTable { .. }
                | Self::DatabaseOpen { .. }
                | Self::DatabaseQuery(_)
                | Self::DatabaseMigration { .. }
                | Self::DirectoryCreate { .. }
        )
    }
}
