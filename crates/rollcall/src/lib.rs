//! `rollcall` - Remote attendance ledger with duplicate-free daily check-ins
//!
//! Students check in by name at most once per calendar day. Instructors,
//! behind a shared secret, list the days on record, view a day's check-ins in
//! time order and export them as CSV. The table lives in a flat CSV file or a
//! `SQLite` database.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod ledger;
pub mod logging;
pub mod record;
pub mod shell;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use ledger::LedgerWriter;
pub use logging::init_logging;
pub use record::AttendanceRecord;
pub use shell::{CheckIn, Session, Shell};
pub use storage::{open_store, RecordStore};
