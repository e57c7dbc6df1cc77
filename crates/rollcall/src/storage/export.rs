//! Downloadable copies of the attendance table.

use chrono::NaiveDate;

use super::table::{decode_table, encode_table, UTF8_BOM};
use crate::error::{Error, Result};
use crate::record::{format_date, AttendanceRecord};

/// Encode records as a standalone table for download.
///
/// The output is UTF-8 with a leading byte-order mark so spreadsheet tools
/// pick the right encoding for non-ASCII names.
#[must_use]
pub fn export(records: &[AttendanceRecord]) -> Vec<u8> {
    let mut bytes = Vec::from(UTF8_BOM.as_bytes());
    bytes.extend_from_slice(encode_table(records).as_bytes());
    bytes
}

/// Decode bytes produced by [`export`].
///
/// # Errors
///
/// Returns [`Error::MalformedTable`] if the bytes are not UTF-8 or not a
/// well-formed table.
pub fn decode_export(bytes: &[u8]) -> Result<Vec<AttendanceRecord>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| Error::malformed(1, "export is not valid UTF-8"))?;
    decode_table(text)
}

/// File name for the export of one day, `attendance_<date>.csv`.
#[must_use]
pub fn export_file_name(date: NaiveDate) -> String {
    format!("attendance_{}.csv", format_date(date))
}
