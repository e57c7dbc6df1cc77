//! In-memory store for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::RecordStore;
use crate::error::{Error, Result};
use crate::record::AttendanceRecord;

/// Volatile store for unit tests.
///
/// Counts loads and saves so tests can check a code path never touched
/// storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<AttendanceRecord>>,
    loads: AtomicUsize,
    saves: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `records`.
    #[must_use]
    pub fn with_records(records: Vec<AttendanceRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Number of completed loads.
    #[must_use]
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of completed saves.
    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> Result<Vec<AttendanceRecord>> {
        let records = self
            .records
            .lock()
            .map_err(|_| Error::internal("memory store lock poisoned"))?
            .clone();
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(records)
    }

    fn save(&self, records: &[AttendanceRecord]) -> Result<()> {
        *self
            .records
            .lock()
            .map_err(|_| Error::internal("memory store lock poisoned"))? = records.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        ":memory:".to_string()
    }
}
