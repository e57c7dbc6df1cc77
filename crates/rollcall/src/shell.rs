//! The request-level facade the CLI drives.
//!
//! [`Shell`] wires the gates to the ledger. Student check-ins pass the origin
//! gate and then the [`LedgerWriter`]; instructor views need an
//! [`InstructorAccess`] token, which only a granted credential produces.
//! Every request does at most one explicit table load.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::gate::{CredentialVerifier, OriginDecision, OriginGate};
use crate::ledger::{list_dates, query_by_date, LedgerWriter};
use crate::record::AttendanceRecord;
use crate::storage::{export, export_file_name, RecordStore};

/// Per-visitor state carried between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    identity: Option<String>,
}

impl Session {
    /// A session with nobody checked in.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Who this session checked in as, if anyone.
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Forget the checked-in identity so the form is shown again.
    pub fn sign_out(&mut self) {
        self.identity = None;
    }
}

/// Outcome of a student check-in, each with a message for the student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckIn {
    /// The check-in was stored.
    Recorded(AttendanceRecord),
    /// This name already checked in on this date.
    AlreadyCheckedIn {
        /// The day in question.
        date: NaiveDate,
        /// The trimmed name.
        name: String,
    },
    /// The name was empty.
    InvalidName,
    /// The caller isn't on the allowed network.
    OriginDenied,
    /// The caller's network couldn't be determined.
    OriginUnverified,
    /// This session already checked in.
    SessionActive {
        /// Name the session checked in as.
        identity: String,
    },
}

impl CheckIn {
    /// Whether a new record was stored.
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded(_))
    }

    /// Text shown to the student.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Recorded(record) => format!(
                "{}, you were checked in at {}.",
                record.name,
                record.time_text()
            ),
            Self::AlreadyCheckedIn { .. } => "You have already checked in today.".to_string(),
            Self::InvalidName => "Please enter your name.".to_string(),
            Self::OriginDenied => {
                "Check-in is only allowed from the classroom network.".to_string()
            }
            Self::OriginUnverified => "Cannot verify your location, try again.".to_string(),
            Self::SessionActive { identity } => {
                format!("Welcome, {identity}! Your attendance is recorded. You can close this window.")
            }
        }
    }
}

/// Proof that the caller passed the instructor credential check.
#[derive(Debug)]
pub struct InstructorAccess {
    _granted: (),
}

/// One day's view of the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    /// Every date with at least one record, newest first.
    pub dates: Vec<NaiveDate>,
    /// The date being shown. `None` only when the table is empty.
    pub selected: Option<NaiveDate>,
    /// Records of the selected date, earliest check-in first.
    pub records: Vec<AttendanceRecord>,
}

/// A downloadable copy of one day's records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    /// Suggested file name, `attendance_<date>.csv`.
    pub file_name: String,
    /// BOM-prefixed CSV.
    pub bytes: Vec<u8>,
    /// Number of records exported.
    pub count: usize,
}

/// Summary of the table for the `status` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Where the table lives.
    pub location: String,
    /// Total records.
    pub records: usize,
    /// Distinct dates.
    pub dates: usize,
    /// Earliest date on record.
    pub first_date: Option<NaiveDate>,
    /// Latest date on record.
    pub last_date: Option<NaiveDate>,
}

/// Gates plus ledger, one instance per process.
#[derive(Debug)]
pub struct Shell<S> {
    ledger: LedgerWriter<S>,
    origin: Option<OriginGate>,
    verifier: Box<dyn CredentialVerifier>,
}

impl<S: RecordStore> Shell<S> {
    /// Create a shell over `store`. With no `origin` gate, check-ins aren't
    /// location-checked.
    pub fn new(
        store: S,
        origin: Option<OriginGate>,
        verifier: Box<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            ledger: LedgerWriter::new(store),
            origin,
            verifier,
        }
    }

    /// Check a student in.
    ///
    /// Gate denials, blank names and duplicates are outcomes, not errors.
    ///
    /// Only the origin lookup is async. The ledger write is blocking file or
    /// database I/O run on the calling task; a long-running server should call
    /// this from `spawn_blocking` or a dedicated thread.
    ///
    /// # Errors
    ///
    /// Returns a store error if the table can't be read or written.
    pub async fn check_in(
        &self,
        session: &mut Session,
        name: &str,
        now: NaiveDateTime,
    ) -> Result<CheckIn> {
        if let Some(identity) = session.identity() {
            return Ok(CheckIn::SessionActive {
                identity: identity.to_string(),
            });
        }

        if name.trim().is_empty() {
            return Ok(CheckIn::InvalidName);
        }

        if let Some(gate) = &self.origin {
            match gate.check().await {
                OriginDecision::Allowed { .. } => {}
                OriginDecision::Denied { .. } => return Ok(CheckIn::OriginDenied),
                OriginDecision::LookupFailed { .. } => return Ok(CheckIn::OriginUnverified),
            }
        }

        match self.ledger.submit(name, now) {
            Ok(record) => {
                debug!("Session bound to {}", record.name);
                session.identity = Some(record.name.clone());
                Ok(CheckIn::Recorded(record))
            }
            Err(Error::Duplicate { date, name }) => {
                debug!("Duplicate check-in for {name} on {date}");
                Ok(CheckIn::AlreadyCheckedIn { date, name })
            }
            Err(err) if err.is_invalid_input() => Ok(CheckIn::InvalidName),
            Err(err) => Err(err),
        }
    }

    /// Check an instructor credential.
    #[must_use]
    pub fn authorize(&self, secret: &str) -> Option<InstructorAccess> {
        self.verifier
            .verify(secret)
            .is_granted()
            .then_some(InstructorAccess { _granted: () })
    }

    /// Distinct dates on record, newest first.
    ///
    /// # Errors
    ///
    /// Returns a store error if the table can't be read.
    pub fn dates(&self, _access: &InstructorAccess) -> Result<Vec<NaiveDate>> {
        Ok(list_dates(&self.ledger.snapshot()?))
    }

    /// Records of `date`, or of the most recent date when `None`.
    ///
    /// # Errors
    ///
    /// Returns a store error if the table can't be read.
    pub fn dashboard(
        &self,
        _access: &InstructorAccess,
        date: Option<NaiveDate>,
    ) -> Result<Dashboard> {
        let snapshot = self.ledger.snapshot()?;
        let dates = list_dates(&snapshot);
        let selected = date.or_else(|| dates.first().copied());
        let records = selected
            .map(|day| query_by_date(&snapshot, day))
            .unwrap_or_default();
        Ok(Dashboard {
            dates,
            selected,
            records,
        })
    }

    /// Export one day's records, defaulting to the most recent date.
    ///
    /// Returns `None` when there is nothing to export.
    ///
    /// # Errors
    ///
    /// Returns a store error if the table can't be read.
    pub fn export(
        &self,
        access: &InstructorAccess,
        date: Option<NaiveDate>,
    ) -> Result<Option<Export>> {
        let dashboard = self.dashboard(access, date)?;
        let Some(day) = dashboard.selected else {
            return Ok(None);
        };
        if dashboard.records.is_empty() {
            return Ok(None);
        }
        Ok(Some(Export {
            file_name: export_file_name(day),
            bytes: export(&dashboard.records),
            count: dashboard.records.len(),
        }))
    }

    /// Table summary. Not gated: it reveals no names.
    ///
    /// # Errors
    ///
    /// Returns a store error if the table can't be read.
    pub fn status(&self) -> Result<Status> {
        let snapshot = self.ledger.snapshot()?;
        let dates = list_dates(&snapshot);
        Ok(Status {
            location: self.ledger.location()?,
            records: snapshot.len(),
            dates: dates.len(),
            first_date: dates.last().copied(),
            last_date: dates.first().copied(),
        })
    }
}
