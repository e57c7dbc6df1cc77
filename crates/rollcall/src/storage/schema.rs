//! `SQLite` schema definitions for the attendance store.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the attendance table.
///
/// `UNIQUE (date, name)` is what lets the store itself refuse a second
/// check-in for the same student and day.
pub const CREATE_ATTENDANCE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS attendance (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    name TEXT NOT NULL,
    time TEXT NOT NULL,
    UNIQUE (date, name)
)
";

/// SQL statement to create an index on date for per-day queries.
pub const CREATE_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance(date DESC)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_ATTENDANCE_TABLE,
    CREATE_DATE_INDEX,
    CREATE_METADATA_TABLE,
];
