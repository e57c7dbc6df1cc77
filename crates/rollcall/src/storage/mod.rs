//! Storage layer for rollcall.
//!
//! This module provides the persisted attendance table behind the
//! [`RecordStore`] trait, with two backends:
//! - [`CsvStore`]: a flat delimited text file, rewritten atomically
//! - [`SqliteStore`]: a `SQLite` database with a unique `(date, name)` key

mod csv_store;
pub mod export;
#[cfg(test)]
mod memory;
pub mod migrations;
pub mod schema;
mod sqlite;
pub mod table;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::record::AttendanceRecord;

pub use csv_store::CsvStore;
#[cfg(test)]
pub(crate) use memory::MemoryStore;
pub use export::{decode_export, export, export_file_name};
pub use sqlite::SqliteStore;

/// Durable home of the full attendance table.
///
/// Stores know nothing about the uniqueness rule unless they enforce it
/// natively; the ledger is the only writer.
pub trait RecordStore {
    /// Read the whole table in insertion order.
    ///
    /// A table that doesn't exist yet is empty, not an error.
    ///
    /// # Errors
    ///
    /// Returns a store error if the table can't be read or is malformed.
    fn load(&self) -> Result<Vec<AttendanceRecord>>;

    /// Replace the whole table with `records`.
    ///
    /// # Errors
    ///
    /// Returns a store error if the table can't be written. The previous
    /// table is left intact.
    fn save(&self, records: &[AttendanceRecord]) -> Result<()>;

    /// Persist `snapshot` extended by `record`.
    ///
    /// The default writes the full extended snapshot through [`save`].
    ///
    /// # Errors
    ///
    /// Returns a store error if the write fails, or [`Error::Conflict`] from
    /// stores that enforce `(date, name)` uniqueness themselves.
    ///
    /// [`save`]: RecordStore::save
    /// [`Error::Conflict`]: crate::Error::Conflict
    fn append(&self, snapshot: &[AttendanceRecord], record: &AttendanceRecord) -> Result<()> {
        let mut next = Vec::with_capacity(snapshot.len() + 1);
        next.extend_from_slice(snapshot);
        next.push(record.clone());
        self.save(&next)
    }

    /// Human-readable location of the table, for status output.
    fn location(&self) -> String;
}

impl<T: RecordStore + ?Sized> RecordStore for Box<T> {
    fn load(&self) -> Result<Vec<AttendanceRecord>> {
        (**self).load()
    }

    fn save(&self, records: &[AttendanceRecord]) -> Result<()> {
        (**self).save(records)
    }

    fn append(&self, snapshot: &[AttendanceRecord], record: &AttendanceRecord) -> Result<()> {
        (**self).append(snapshot, record)
    }

    fn location(&self) -> String {
        (**self).location()
    }
}

/// Which backend holds the attendance table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Delimited text file.
    #[default]
    Csv,
    /// `SQLite` database.
    Sqlite,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Open the store the configuration points at.
///
/// # Errors
///
/// Returns an error if the `SQLite` database can't be opened. The CSV store
/// defers all I/O to the first load or save.
pub fn open_store(config: &Config) -> Result<Box<dyn RecordStore + Send>> {
    let path = config.data_file_path();
    Ok(match config.storage.backend {
        Backend::Csv => Box::new(CsvStore::new(path)),
        Backend::Sqlite => Box::new(SqliteStore::open(path)?),
    })
}
