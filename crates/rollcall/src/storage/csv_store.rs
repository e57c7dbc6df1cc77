//! Flat-file attendance table.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::table::{decode_table, encode_table};
use super::RecordStore;
use crate::error::{Error, Result};
use crate::record::AttendanceRecord;

/// Attendance table persisted as a delimited text file.
///
/// Every save rewrites the whole file through a sibling temp file and a
/// rename, so readers only ever see the old table or the new one.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    /// Create a store for the table at `path`. Nothing is touched until the
    /// first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path to the table file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

impl RecordStore for CsvStore {
    fn load(&self) -> Result<Vec<AttendanceRecord>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("No attendance table at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(Error::StoreRead {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let text = String::from_utf8(bytes).map_err(|err| {
            let valid = &err.as_bytes()[..err.utf8_error().valid_up_to()];
            let line = valid.iter().filter(|b| **b == b'\n').count() + 1;
            Error::malformed(line, "table is not valid UTF-8")
        })?;

        let records = decode_table(&text)?;
        debug!(
            "Loaded {} attendance records from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }

    fn save(&self, records: &[AttendanceRecord]) -> Result<()> {
        self.ensure_parent_dir()?;
        let text = encode_table(records);
        write_atomic(&self.path, text.as_bytes()).map_err(|source| Error::StoreWrite {
            path: self.path.clone(),
            source,
        })?;
        debug!(
            "Saved {} attendance records to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Replace `path` with `bytes` via a synced temp file in the same directory.
///
/// Each call gets its own uniquely named temp file, so concurrent writers
/// never share one and whichever rename lands last wins whole.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{}.", file_name.to_string_lossy()))
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn record(name: &str, h: u32, m: u32) -> AttendanceRecord {
        AttendanceRecord::new(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            name,
            NaiveTime::from_hms_opt(h, m, 0).unwrap(),
        )
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("attendance.csv"));

        assert!(store.load().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("attendance.csv"));
        let records = vec![record("A", 9, 0), record("홍길동", 8, 30)];

        store.save(&records).unwrap();
        assert_eq!(store.load().unwrap(), records);
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attendance.csv");
        let original = "date,name,time\n\
                        2024-01-02,홍길동,08:30:00\n\
                        2024-01-02,\"Doe, Jane\",09:00:00\n\
                        2024-01-03,Ærøskøbing,10:00:00\n";
        fs::write(&path, original).unwrap();

        let store = CsvStore::new(&path);
        let records = store.load().unwrap();
        store.save(&records).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("attendance.csv");
        let store = CsvStore::new(&path);

        store.save(&[record("A", 9, 0)]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("attendance.csv"));
        store.save(&[record("A", 9, 0)]).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["attendance.csv".to_string()]);
    }

    #[test]
    fn test_failed_save_reports_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attendance.csv");
        // A non-empty directory at the table path makes the final rename fail.
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let err = CsvStore::new(&path).save(&[record("A", 9, 0)]).unwrap_err();
        assert!(matches!(err, Error::StoreWrite { .. }));
        assert!(err.is_store_error());

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["attendance.csv".to_string()]);
    }

    #[test]
    fn test_concurrent_saves_both_land_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attendance.csv");
        let first = vec![record("A", 9, 0)];
        let second = vec![record("B", 8, 0), record("C", 8, 5)];

        for _ in 0..100 {
            let barrier = Arc::new(Barrier::new(2));
            let handles: Vec<_> = [first.clone(), second.clone()]
                .into_iter()
                .map(|table| {
                    let barrier = Arc::clone(&barrier);
                    let path = path.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        CsvStore::new(path).save(&table)
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap().unwrap();
            }
            let on_disk = CsvStore::new(&path).load().unwrap();
            assert!(on_disk == first || on_disk == second);
        }
    }

    #[test]
    fn test_load_malformed_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attendance.csv");
        fs::write(&path, "date,name,time\n2024-01-02,A\n").unwrap();

        let err = CsvStore::new(&path).load().unwrap_err();
        assert!(matches!(err, Error::MalformedTable { line: 2, .. }));
    }

    #[test]
    fn test_load_invalid_utf8_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attendance.csv");
        fs::write(&path, b"date,name,time\n2024-01-02,\xff\xfe,09:00:00\n").unwrap();

        let err = CsvStore::new(&path).load().unwrap_err();
        assert!(matches!(err, Error::MalformedTable { line: 2, .. }));
    }

    #[test]
    fn test_load_directory_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvStore::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, Error::StoreRead { .. }));
    }

    #[test]
    fn test_location() {
        let store = CsvStore::new("/srv/rollcall/attendance.csv");
        assert_eq!(store.location(), "/srv/rollcall/attendance.csv");
    }
}
