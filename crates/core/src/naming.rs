use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;

pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H-%M-%S";

/// Canonical base name for a timestamp: `YYYY-MM-DD HH-MM-SS`.
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(CANONICAL_FORMAT).to_string()
}

/// Full target file name. `counter` 0 means no suffix.
pub fn target_file_name(base: &str, extension: &str, counter: u32) -> String {
    let mut name = base.to_string();
    if counter > 0 {
        name.push_str(&format!("_{:03}", counter));
    }
    if !extension.is_empty() {
        name.push('.');
        name.push_str(extension);
    }
    name
}

/// Reads a date back out of a file name.
///
/// Recognised stems, anything trailing the seconds is ignored:
/// `YYYY-MM-DD HH-MM-SS`, `YYYY-MM-DD_HH.MM.SS` (either separator mix),
/// `YYYYMMDD_HHMMSS`, and a bare `YYYY-MM-DD` which maps to midnight.
pub fn parse_filename_date(file_name: &str) -> Option<NaiveDateTime> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;
    let bytes = stem.as_bytes();

    parse_separated(bytes)
        .or_else(|| parse_compact(bytes))
        .or_else(|| parse_date_only(bytes))
}

fn parse_separated(b: &[u8]) -> Option<NaiveDateTime> {
    if b.len() < 19 {
        return None;
    }
    if b[4] != b'-' || b[7] != b'-' {
        return None;
    }
    if !(b[10] == b'_' || b[10].is_ascii_whitespace()) {
        return None;
    }
    if !is_time_separator(b[13]) || !is_time_separator(b[16]) {
        return None;
    }
    build(
        number(b, 0, 4)?,
        number(b, 5, 2)?,
        number(b, 8, 2)?,
        number(b, 11, 2)?,
        number(b, 14, 2)?,
        number(b, 17, 2)?,
    )
}

fn parse_compact(b: &[u8]) -> Option<NaiveDateTime> {
    if b.len() < 15 || b[8] != b'_' {
        return None;
    }
    build(
        number(b, 0, 4)?,
        number(b, 4, 2)?,
        number(b, 6, 2)?,
        number(b, 9, 2)?,
        number(b, 11, 2)?,
        number(b, 13, 2)?,
    )
}

fn parse_date_only(b: &[u8]) -> Option<NaiveDateTime> {
    if b.len() != 10 || b[4] != b'-' || b[7] != b'-' {
        return None;
    }
    build(number(b, 0, 4)?, number(b, 5, 2)?, number(b, 8, 2)?, 0, 0, 0)
}

fn is_time_separator(ch: u8) -> bool {
    ch == b'-' || ch == b'.'
}

fn number(b: &[u8], start: usize, len: usize) -> Option<u32> {
    let slice = b.get(start..start + len)?;
    if !slice.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(
        slice
            .iter()
            .fold(0u32, |acc, d| acc * 10 + u32::from(d - b'0')),
    )
}

fn build(y: u32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(i32::try_from(y).ok()?, m, d)?.and_hms_opt(h, mi, s)
}
