use crate::exif_reader::ReaderRegistry;
use crate::naming::parse_filename_date;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_TOLERANCE_SECS: i64 = 2;

/// Result of comparing a file's name with its EXIF date taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MismatchOutcome {
    Match {
        filename_date: NaiveDateTime,
        exif_date: NaiveDateTime,
    },
    Mismatch {
        filename_date: NaiveDateTime,
        exif_date: NaiveDateTime,
    },
    NoExifDate,
    UnparseableName,
    ReadFailed {
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct MismatchEntry {
    pub path: PathBuf,
    pub outcome: MismatchOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MismatchReport {
    pub entries: Vec<MismatchEntry>,
    pub checked: usize,
    pub mismatches: usize,
}

pub fn check_file(
    path: &Path,
    readers: &mut ReaderRegistry,
    tolerance_secs: i64,
) -> MismatchOutcome {
    let exif_date = match readers.read_date_taken(path) {
        Ok(Some(date)) => date,
        Ok(None) => return MismatchOutcome::NoExifDate,
        Err(err) => {
            return MismatchOutcome::ReadFailed {
                reason: format!("{err:#}"),
            }
        }
    };
    let file_name = path
        .file_name()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_default();
    let Some(filename_date) = parse_filename_date(&file_name) else {
        return MismatchOutcome::UnparseableName;
    };

    if (filename_date - exif_date).num_seconds().abs() > tolerance_secs {
        MismatchOutcome::Mismatch {
            filename_date,
            exif_date,
        }
    } else {
        MismatchOutcome::Match {
            filename_date,
            exif_date,
        }
    }
}

pub fn check_files(
    paths: &[PathBuf],
    readers: &mut ReaderRegistry,
    tolerance_secs: i64,
) -> MismatchReport {
    let mut report = MismatchReport::default();
    for path in paths {
        let outcome = check_file(path, readers, tolerance_secs);
        report.checked += 1;
        if matches!(outcome, MismatchOutcome::Mismatch { .. }) {
            report.mismatches += 1;
        }
        report.entries.push(MismatchEntry {
            path: path.clone(),
            outcome,
        });
    }
    report
}
