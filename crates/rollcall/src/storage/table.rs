//! Delimited text encoding of the attendance table.
//!
//! The table is comma-separated with a `date,name,time` header row. Fields are
//! quoted only when they contain a comma, a quote, or a line break, and quotes
//! inside quoted fields are doubled. Writing always uses `\n`; reading also
//! accepts `\r\n` and skips blank lines.

use std::borrow::Cow;
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::record::{parse_date, parse_time, AttendanceRecord};

/// Column names in table order.
pub const COLUMNS: [&str; 3] = ["date", "name", "time"];

/// UTF-8 byte-order mark, written in front of exports.
pub const UTF8_BOM: &str = "\u{feff}";

/// Encode records as table text, header first.
#[must_use]
pub fn encode_table(records: &[AttendanceRecord]) -> String {
    let mut out = String::with_capacity(16 + records.len() * 32);
    out.push_str(&COLUMNS.join(","));
    out.push('\n');

    for record in records {
        out.push_str(&record.date_text());
        out.push(',');
        out.push_str(&escape_field(&record.name));
        out.push(',');
        out.push_str(&record.time_text());
        out.push('\n');
    }
    out
}

/// Decode table text into records, preserving row order.
///
/// A leading byte-order mark is ignored and empty text is an empty table.
///
/// # Errors
///
/// Returns [`Error::MalformedTable`] naming the first offending line if the
/// header is wrong, a row doesn't have exactly three columns, a date or time
/// isn't in canonical form, a name is blank, quoting is broken, or the same
/// `(date, name)` appears twice.
pub fn decode_table(text: &str) -> Result<Vec<AttendanceRecord>> {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
    let mut rows = split_rows(text)?.into_iter();

    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    if header.fields != COLUMNS {
        return Err(Error::malformed(
            header.line,
            format!(
                "expected header `{}`, found `{}`",
                COLUMNS.join(","),
                header.fields.join(",")
            ),
        ));
    }

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    for row in rows {
        let record = row_to_record(&row)?;
        if !seen.insert((record.date, record.name.clone())) {
            return Err(Error::malformed(
                row.line,
                format!("second entry for {} on {}", record.name, record.date_text()),
            ));
        }
        records.push(record);
    }
    Ok(records)
}

fn row_to_record(row: &Row) -> Result<AttendanceRecord> {
    let [date, name, time] = row.fields.as_slice() else {
        return Err(Error::malformed(
            row.line,
            format!("expected 3 columns, found {}", row.fields.len()),
        ));
    };

    let date = parse_date(date)
        .ok_or_else(|| Error::malformed(row.line, format!("invalid date `{date}`")))?;
    let time = parse_time(time)
        .ok_or_else(|| Error::malformed(row.line, format!("invalid time `{time}`")))?;
    if name.trim().is_empty() {
        return Err(Error::malformed(row.line, "empty name"));
    }

    Ok(AttendanceRecord {
        date,
        name: name.clone(),
        time,
    })
}

/// Quote a field if it contains a delimiter, a quote, or a line break.
fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// One parsed row and the line it starts on.
#[derive(Debug)]
struct Row {
    line: usize,
    fields: Vec<String>,
}

/// Accumulates fields for the row currently being read.
#[derive(Debug, Default)]
struct RowBuilder {
    fields: Vec<String>,
    field: String,
    quoted: bool,
}

impl RowBuilder {
    fn end_field(&mut self) {
        self.fields.push(std::mem::take(&mut self.field));
        self.quoted = false;
    }

    fn is_blank(&self) -> bool {
        self.fields.is_empty() && self.field.is_empty() && !self.quoted
    }

    /// Finish the row, returning `None` for a blank line.
    fn finish(&mut self, line: usize) -> Option<Row> {
        if self.is_blank() {
            return None;
        }
        self.end_field();
        Some(Row {
            line,
            fields: std::mem::take(&mut self.fields),
        })
    }
}

fn split_rows(text: &str) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    let mut builder = RowBuilder::default();
    let mut in_quotes = false;
    let mut line = 1;
    let mut row_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    builder.field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    builder.field.push(c);
                }
                _ => builder.field.push(c),
            }
            continue;
        }

        match c {
            '"' if builder.field.is_empty() && !builder.quoted => {
                in_quotes = true;
                builder.quoted = true;
            }
            '"' => return Err(Error::malformed(line, "stray quote in unquoted field")),
            ',' => builder.end_field(),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                rows.extend(builder.finish(row_line));
                line += 1;
                row_line = line;
            }
            _ if builder.quoted => {
                return Err(Error::malformed(line, "text after closing quote"));
            }
            _ => builder.field.push(c),
        }
    }

    if in_quotes {
        return Err(Error::malformed(row_line, "unterminated quoted field"));
    }
    rows.extend(builder.finish(row_line));
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn record(date: &str, name: &str, time: &str) -> AttendanceRecord {
        AttendanceRecord::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            name,
            NaiveTime::parse_from_str(time, "%H:%M:%S").unwrap(),
        )
    }

    #[test]
    fn test_encode_empty_has_header() {
        assert_eq!(encode_table(&[]), "date,name,time\n");
    }

    #[test]
    fn test_encode_rows() {
        let text = encode_table(&[
            record("2024-01-02", "A", "09:00:00"),
            record("2024-01-02", "홍길동", "08:30:00"),
        ]);
        assert_eq!(
            text,
            "date,name,time\n2024-01-02,A,09:00:00\n2024-01-02,홍길동,08:30:00\n"
        );
    }

    #[test]
    fn test_encode_quotes_when_needed() {
        let text = encode_table(&[record("2024-01-02", "Doe, \"JD\" Jane", "09:00:00")]);
        assert_eq!(
            text,
            "date,name,time\n2024-01-02,\"Doe, \"\"JD\"\" Jane\",09:00:00\n"
        );
    }

    #[test]
    fn test_decode_matches_encode() {
        let records = vec![
            record("2024-01-02", "A", "09:00:00"),
            record("2024-01-02", "Doe, Jane", "09:01:00"),
            record("2024-01-03", "line\nbreak", "10:00:00"),
            record("2024-01-03", "홍길동", "10:05:00"),
        ];
        let text = encode_table(&records);
        assert_eq!(decode_table(&text).unwrap(), records);
    }

    #[test]
    fn test_decode_empty_text() {
        assert!(decode_table("").unwrap().is_empty());
        assert!(decode_table(UTF8_BOM).unwrap().is_empty());
    }

    #[test]
    fn test_decode_header_only() {
        assert!(decode_table("date,name,time\n").unwrap().is_empty());
    }

    #[test]
    fn test_decode_strips_bom_and_crlf() {
        let text = "\u{feff}date,name,time\r\n2024-01-02,A,09:00:00\r\n";
        let records = decode_table(text).unwrap();
        assert_eq!(records, vec![record("2024-01-02", "A", "09:00:00")]);
    }

    #[test]
    fn test_decode_skips_blank_lines() {
        let text = "date,name,time\n\n2024-01-02,A,09:00:00\n\n";
        assert_eq!(decode_table(text).unwrap().len(), 1);
    }

    #[test]
    fn test_decode_without_trailing_newline() {
        let text = "date,name,time\n2024-01-02,A,09:00:00";
        assert_eq!(decode_table(text).unwrap().len(), 1);
    }

    #[test]
    fn test_decode_rejects_wrong_header() {
        let err = decode_table("날짜,이름,출석 시간\n").unwrap_err();
        assert!(matches!(err, Error::MalformedTable { line: 1, .. }));
    }

    #[test]
    fn test_decode_rejects_wrong_column_count() {
        let err = decode_table("date,name,time\n2024-01-02,A\n").unwrap_err();
        match err {
            Error::MalformedTable { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("found 2"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_rejects_bad_date_and_time() {
        let err = decode_table("date,name,time\n2024/01/02,A,09:00:00\n").unwrap_err();
        assert!(err.to_string().contains("invalid date"));

        let err = decode_table("date,name,time\n2024-01-02,A,9am\n").unwrap_err();
        assert!(err.to_string().contains("invalid time"));
    }

    #[test]
    fn test_decode_rejects_blank_name() {
        let err = decode_table("date,name,time\n2024-01-02,  ,09:00:00\n").unwrap_err();
        assert!(err.to_string().contains("empty name"));
    }

    #[test]
    fn test_decode_rejects_repeated_entry() {
        let text = "date,name,time\n2024-01-02,A,09:00:00\n2024-01-02,A,09:05:00\n";
        let err = decode_table(text).unwrap_err();
        assert!(matches!(err, Error::MalformedTable { line: 3, .. }));
    }

    #[test]
    fn test_decode_rejects_broken_quoting() {
        let err = decode_table("date,name,time\n2024-01-02,\"A,09:00:00\n").unwrap_err();
        assert!(err.to_string().contains("unterminated"));

        let err = decode_table("date,name,time\n2024-01-02,A\"B,09:00:00\n").unwrap_err();
        assert!(err.to_string().contains("stray quote"));

        let err = decode_table("date,name,time\n2024-01-02,\"A\"B,09:00:00\n").unwrap_err();
        assert!(err.to_string().contains("after closing quote"));
    }

    #[test]
    fn test_line_numbers_follow_embedded_newlines() {
        let text = "date,name,time\n2024-01-02,\"two\nlines\",09:00:00\n2024-01-02,B\n";
        let err = decode_table(text).unwrap_err();
        assert!(matches!(err, Error::MalformedTable { line: 4, .. }));
    }
}
