//! Attendance ledger rules.
//!
//! The free functions here are the whole rulebook: they work on a snapshot the
//! caller loaded and touch the store only to persist an accepted check-in.
//! [`submit`] on its own is a check-then-act sequence, so two callers holding
//! the same stale snapshot can both pass the duplicate check. [`LedgerWriter`]
//! closes that gap by reloading and submitting under one lock.

use std::collections::BTreeSet;
use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::AttendanceRecord;
use crate::storage::RecordStore;

/// Record a check-in for `name` at `now`.
///
/// The name is trimmed first; an empty result is rejected before the store is
/// touched. On success the record has been persisted and appended to
/// `snapshot`. On any error `snapshot` is unchanged.
///
/// # Errors
///
/// - [`Error::InvalidInput`] if the name is empty or whitespace
/// - [`Error::Duplicate`] if `(date, name)` is already in the snapshot, or the
///   store rejected it as a conflict
/// - a store error if persisting failed
pub fn submit<S: RecordStore + ?Sized>(
    store: &S,
    snapshot: &mut Vec<AttendanceRecord>,
    name: &str,
    now: NaiveDateTime,
) -> Result<AttendanceRecord> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::invalid_input("name must not be empty"));
    }

    let record = AttendanceRecord::stamped(name, now);
    if snapshot.iter().any(|r| r.is_entry_for(record.date, name)) {
        debug!("Rejecting second check-in for {} on {}", name, record.date);
        return Err(Error::Duplicate {
            date: record.date,
            name: name.to_string(),
        });
    }

    store.append(snapshot, &record).map_err(|err| match err {
        Error::Conflict { date, name } => Error::Duplicate { date, name },
        other => other,
    })?;

    info!("Recorded check-in {record}");
    snapshot.push(record.clone());
    Ok(record)
}

/// Distinct dates present in the snapshot, most recent first.
#[must_use]
pub fn list_dates(snapshot: &[AttendanceRecord]) -> Vec<NaiveDate> {
    let dates: BTreeSet<NaiveDate> = snapshot.iter().map(|r| r.date).collect();
    dates.into_iter().rev().collect()
}

/// Records for `date`, earliest check-in first.
///
/// Check-ins with the same time keep their stored order.
#[must_use]
pub fn query_by_date(snapshot: &[AttendanceRecord], date: NaiveDate) -> Vec<AttendanceRecord> {
    let mut records: Vec<_> = snapshot.iter().filter(|r| r.date == date).cloned().collect();
    records.sort_by_key(|r| r.time);
    records
}

/// Single writer in front of a store.
///
/// Every submission reloads the table and runs [`submit`] while holding the
/// writer's lock, so concurrent callers sharing one `LedgerWriter` can't both
/// pass the duplicate check.
#[derive(Debug)]
pub struct LedgerWriter<S> {
    store: Mutex<S>,
}

impl<S: RecordStore> LedgerWriter<S> {
    /// Wrap `store`. All writes to it should go through this writer.
    pub fn new(store: S) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Record a check-in against the current table.
    ///
    /// # Errors
    ///
    /// Same as [`submit`], plus any error loading the table.
    pub fn submit(&self, name: &str, now: NaiveDateTime) -> Result<AttendanceRecord> {
        let store = self.lock()?;
        let mut snapshot = if name.trim().is_empty() {
            Vec::new()
        } else {
            store.load()?
        };
        submit(&*store, &mut snapshot, name, now)
    }

    /// Load the current table.
    ///
    /// # Errors
    ///
    /// Returns a store error if the table can't be read.
    pub fn snapshot(&self) -> Result<Vec<AttendanceRecord>> {
        self.lock()?.load()
    }

    /// Location of the underlying table.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer's lock was poisoned.
    pub fn location(&self) -> Result<String> {
        Ok(self.lock()?.location())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, S>> {
        self.store
            .lock()
            .map_err(|_| Error::internal("ledger writer lock poisoned"))
    }
}
