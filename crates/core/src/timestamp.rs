use crate::exif_reader::ReaderRegistry;
use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampMode {
    Modified,
    ExifDateTaken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampOrigin {
    Modified,
    Exif,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractorConfig {
    pub mode: TimestampMode,
    pub use_exiftool: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            mode: TimestampMode::Modified,
            use_exiftool: true,
        }
    }
}

pub struct TimestampExtractor {
    mode: TimestampMode,
    readers: ReaderRegistry,
}

impl TimestampExtractor {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self::with_readers(config.mode, ReaderRegistry::new(config.use_exiftool))
    }

    pub fn with_readers(mode: TimestampMode, readers: ReaderRegistry) -> Self {
        Self { mode, readers }
    }

    pub fn mode(&self) -> TimestampMode {
        self.mode
    }

    /// `Ok(None)` is the "missing" signal; `Err` is a per-file I/O failure.
    pub fn extract(&mut self, path: &Path) -> Result<Option<NaiveDateTime>> {
        match self.mode {
            TimestampMode::Modified => modified_time(path).map(Some),
            TimestampMode::ExifDateTaken => self.readers.read_date_taken(path),
        }
    }
}

/// Last-modified time as local wall-clock time.
pub fn modified_time(path: &Path) -> Result<NaiveDateTime> {
    let time = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .with_context(|| format!("Could not read modified time: {}", path.display()))?;
    Ok(DateTime::<Local>::from(time).naive_local())
}
