//! Core attendance types for rollcall.
//!
//! This module defines the attendance record and the text forms its date and
//! time-of-day take in the persisted table.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// `strftime` pattern for the `date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// `strftime` pattern for the `time` column.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// A single attendance entry.
///
/// Records are immutable once created. For any `(date, name)` pair the ledger
/// holds at most one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Local calendar day of the check-in.
    pub date: NaiveDate,

    /// Student identity as submitted (surrounding whitespace removed).
    pub name: String,

    /// Local time-of-day the record was created, whole seconds.
    pub time: NaiveTime,
}

impl AttendanceRecord {
    /// Create a record from its parts.
    ///
    /// Sub-second precision on `time` is dropped so the record matches what
    /// the table can hold.
    #[must_use]
    pub fn new(date: NaiveDate, name: impl Into<String>, time: NaiveTime) -> Self {
        Self {
            date,
            name: name.into(),
            time: truncate_to_seconds(time),
        }
    }

    /// Create a record stamped with the given local timestamp.
    #[must_use]
    pub fn stamped(name: impl Into<String>, now: NaiveDateTime) -> Self {
        Self::new(now.date(), name, now.time())
    }

    /// Whether this record occupies the `(date, name)` slot.
    #[must_use]
    pub fn is_entry_for(&self, date: NaiveDate, name: &str) -> bool {
        self.date == date && self.name == name
    }

    /// The `date` column text, `YYYY-MM-DD`.
    #[must_use]
    pub fn date_text(&self) -> String {
        format_date(self.date)
    }

    /// The `time` column text, `HH:MM:SS`.
    #[must_use]
    pub fn time_text(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }
}

impl std::fmt::Display for AttendanceRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{} on {}", self.name, self.time_text(), self.date_text())
    }
}

/// Format a date the way the table stores it.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` date, rejecting non-canonical spellings like `2024-1-2`.
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .filter(|date| format_date(*date) == text)
}

/// Parse a `HH:MM:SS` time, rejecting non-canonical spellings.
#[must_use]
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, TIME_FORMAT)
        .ok()
        .filter(|time| time.format(TIME_FORMAT).to_string() == text)
}

fn truncate_to_seconds(time: NaiveTime) -> NaiveTime {
    time.with_nanosecond(0).unwrap_or(time)
}
