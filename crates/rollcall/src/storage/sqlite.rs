//! `SQLite`-backed attendance store.
//!
//! Unlike the flat file, this store enforces the one-entry-per-student-per-day
//! rule itself: an insert for a taken `(date, name)` fails with
//! [`Error::Conflict`] no matter how stale the caller's snapshot was.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, ErrorCode};
use tracing::{debug, info};

use super::{migrations, RecordStore};
use crate::error::{Error, Result};
use crate::record::{parse_date, parse_time, AttendanceRecord};

/// How long a writer waits on another connection's lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Attendance store in a `SQLite` database.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl SqliteStore {
    /// Open or create an attendance database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn insert(&self, record: &AttendanceRecord) -> Result<()> {
        self.conn
            .prepare_cached("INSERT INTO attendance (date, name, time) VALUES (?1, ?2, ?3)")?
            .execute(params![record.date_text(), record.name, record.time_text()])
            .map_err(|err| conflict_or(err, record))?;
        Ok(())
    }
}

impl RecordStore for SqliteStore {
    fn load(&self) -> Result<Vec<AttendanceRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT date, name, time FROM attendance ORDER BY id")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .enumerate()
            .map(|(index, (date, name, time))| {
                let line = index + 1;
                let date = parse_date(&date)
                    .ok_or_else(|| Error::malformed(line, format!("invalid date `{date}`")))?;
                let time = parse_time(&time)
                    .ok_or_else(|| Error::malformed(line, format!("invalid time `{time}`")))?;
                if name.trim().is_empty() {
                    return Err(Error::malformed(line, "empty name"));
                }
                Ok(AttendanceRecord { date, name, time })
            })
            .collect()
    }

    fn save(&self, records: &[AttendanceRecord]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM attendance", [])?;
        for record in records {
            self.insert(record)?;
        }
        tx.commit()?;
        debug!("Replaced attendance table with {} records", records.len());
        Ok(())
    }

    fn append(&self, _snapshot: &[AttendanceRecord], record: &AttendanceRecord) -> Result<()> {
        self.insert(record)?;
        debug!("Inserted {record}");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

fn conflict_or(err: rusqlite::Error, record: &AttendanceRecord) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            Error::Conflict {
                date: record.date,
                name: record.name.clone(),
            }
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("failed to create test store")
    }

    fn record(day: u32, name: &str, h: u32) -> AttendanceRecord {
        AttendanceRecord::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            name,
            NaiveTime::from_hms_opt(h, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_open_in_memory_is_empty() {
        let store = create_test_store();
        assert!(store.load().unwrap().is_empty());
        assert_eq!(store.path(), Path::new(":memory:"));
    }

    #[test]
    fn test_append_and_load_in_order() {
        let store = create_test_store();
        store.append(&[], &record(2, "B", 9)).unwrap();
        store.append(&[], &record(2, "A", 8)).unwrap();

        let names: Vec<_> = store.load().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_append_conflict() {
        let store = create_test_store();
        store.append(&[], &record(2, "A", 9)).unwrap();

        let err = store.append(&[], &record(2, "A", 10)).unwrap_err();
        assert!(matches!(err, Error::Conflict { ref name, .. } if name == "A"));
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_same_name_other_day_is_not_conflict() {
        let store = create_test_store();
        store.append(&[], &record(2, "A", 9)).unwrap();
        store.append(&[], &record(3, "A", 9)).unwrap();
        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[test]
    fn test_save_replaces_table() {
        let store = create_test_store();
        store.append(&[], &record(2, "A", 9)).unwrap();

        let replacement = vec![record(3, "홍길동", 8), record(3, "B", 9)];
        store.save(&replacement).unwrap();
        assert_eq!(store.load().unwrap(), replacement);
    }

    #[test]
    fn test_save_with_repeated_entry_rolls_back() {
        let store = create_test_store();
        store.append(&[], &record(2, "A", 9)).unwrap();

        let err = store
            .save(&[record(3, "B", 9), record(3, "B", 10)])
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
        assert_eq!(store.load().unwrap(), vec![record(2, "A", 9)]);
    }

    #[test]
    fn test_load_rejects_corrupt_row() {
        let store = create_test_store();
        store
            .conn
            .execute(
                "INSERT INTO attendance (date, name, time) VALUES ('yesterday', 'A', '09:00:00')",
                [],
            )
            .unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, Error::MalformedTable { line: 1, .. }));
    }

    #[test]
    fn test_open_file_based_persists() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("attendance.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store.append(&[], &record(2, "홍길동", 9)).unwrap();
            assert_eq!(store.path(), db_path);
        }

        let reopened = SqliteStore::open(&db_path).unwrap();
        assert_eq!(reopened.load().unwrap(), vec![record(2, "홍길동", 9)]);
        assert_eq!(reopened.location(), db_path.display().to_string());
    }
}
