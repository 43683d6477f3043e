use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime};
use exif::{In, Reader, Tag, Value};
use exiftool::ExifTool;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

pub const COMMON_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif"];
pub const RAW_EXTENSIONS: &[&str] = &[
    "cr2", "cr3", "nef", "arw", "dng", "orf", "rw2", "pef", "srw", "raf",
];

/// Reads the "date taken" (`DateTimeOriginal`) of one file.
///
/// `Ok(None)` means the file was readable but carries no usable date.
/// `Err` is reserved for I/O failures on the file itself.
pub trait DateTakenReader {
    fn read_date_taken(&mut self, path: &Path) -> Result<Option<NaiveDateTime>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatFamily {
    Common,
    Raw,
}

impl FormatFamily {
    pub fn from_extension(extension: &str) -> Option<Self> {
        let lower = extension.to_ascii_lowercase();
        if COMMON_EXTENSIONS.contains(&lower.as_str()) {
            Some(Self::Common)
        } else if RAW_EXTENSIONS.contains(&lower.as_str()) {
            Some(Self::Raw)
        } else {
            None
        }
    }
}

/// JPEG/PNG/TIFF via the in-process container parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContainerExifReader;

impl DateTakenReader for ContainerExifReader {
    fn read_date_taken(&mut self, path: &Path) -> Result<Option<NaiveDateTime>> {
        read_container_date(path)
    }
}

/// RAW files: TIFF-based containers parse in-process; the rest (CR3, RAF,
/// ORF, RW2) go through an `exiftool` process kept open for the whole run.
pub struct RawExifReader {
    exiftool: ExifToolHandle,
}

enum ExifToolHandle {
    Disabled,
    Untried,
    Unavailable,
    Ready(Box<ExifTool>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExifToolDates {
    #[serde(default)]
    date_time_original: Option<String>,
}

impl RawExifReader {
    pub fn new(use_exiftool: bool) -> Self {
        Self {
            exiftool: if use_exiftool {
                ExifToolHandle::Untried
            } else {
                ExifToolHandle::Disabled
            },
        }
    }

    fn exiftool(&mut self) -> Option<&mut ExifTool> {
        if matches!(self.exiftool, ExifToolHandle::Untried) {
            self.exiftool = match ExifTool::new() {
                Ok(tool) => ExifToolHandle::Ready(Box::new(tool)),
                Err(err) => {
                    debug!("exiftool unavailable, RAW fallback disabled: {err}");
                    ExifToolHandle::Unavailable
                }
            };
        }
        match &mut self.exiftool {
            ExifToolHandle::Ready(tool) => Some(tool.as_mut()),
            _ => None,
        }
    }
}

impl DateTakenReader for RawExifReader {
    fn read_date_taken(&mut self, path: &Path) -> Result<Option<NaiveDateTime>> {
        if let Some(date) = read_container_date(path)? {
            return Ok(Some(date));
        }

        let Some(tool) = self.exiftool() else {
            return Ok(None);
        };
        match tool.read_metadata::<ExifToolDates>(path, &[]) {
            Ok(dates) => Ok(dates
                .date_time_original
                .as_deref()
                .and_then(parse_exif_date)),
            Err(err) => {
                debug!("exiftool failed for {}: {err}", path.display());
                Ok(None)
            }
        }
    }
}

/// Extension to reader mapping. One reader instance per format family, so
/// any cached state (the exiftool process) lives exactly as long as this.
pub struct ReaderRegistry {
    common: Box<dyn DateTakenReader>,
    raw: Box<dyn DateTakenReader>,
}

impl ReaderRegistry {
    pub fn new(use_exiftool: bool) -> Self {
        Self::with_readers(
            Box::new(ContainerExifReader),
            Box::new(RawExifReader::new(use_exiftool)),
        )
    }

    pub fn with_readers(common: Box<dyn DateTakenReader>, raw: Box<dyn DateTakenReader>) -> Self {
        Self { common, raw }
    }

    /// Unsupported extensions yield `Ok(None)`.
    pub fn read_date_taken(&mut self, path: &Path) -> Result<Option<NaiveDateTime>> {
        let extension = path
            .extension()
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_default();
        match FormatFamily::from_extension(&extension) {
            Some(FormatFamily::Common) => self.common.read_date_taken(path),
            Some(FormatFamily::Raw) => self.raw.read_date_taken(path),
            None => Ok(None),
        }
    }
}

fn read_container_date(path: &Path) -> Result<Option<NaiveDateTime>> {
    let file = File::open(path)
        .with_context(|| format!("Could not open file for EXIF: {}", path.display()))?;
    let mut buf = BufReader::new(file);
    let exif = match Reader::new().read_from_container(&mut buf) {
        Ok(exif) => exif,
        Err(err) => {
            debug!("no EXIF container in {}: {err}", path.display());
            return Ok(None);
        }
    };
    Ok(date_time_original(&exif))
}

fn date_time_original(exif: &exif::Exif) -> Option<NaiveDateTime> {
    let field = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(values) => values
            .first()
            .and_then(|raw| std::str::from_utf8(raw).ok())
            .and_then(parse_exif_date),
        _ => None,
    }
}

/// Parses the date forms cameras and tools write. Offsets are dropped: the
/// wall-clock time as recorded is what names the file.
pub fn parse_exif_date(input: &str) -> Option<NaiveDateTime> {
    let normalized = input.trim_matches(|c: char| c == '\0' || c.is_whitespace());

    let candidates = [
        "%Y:%m:%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y:%m:%d %H:%M:%S%:z",
        "%Y-%m-%dT%H:%M:%S%:z",
        "%Y-%m-%dT%H:%M:%S%.f%:z",
    ];

    for fmt in candidates {
        if let Ok(dt) = DateTime::parse_from_str(normalized, fmt) {
            return Some(dt.naive_local());
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(normalized, fmt) {
            return Some(naive);
        }
    }

    None
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{
        parse_exif_date, ContainerExifReader, DateTakenReader, FormatFamily, RawExifReader,
        ReaderRegistry,
    };
    use anyhow::Result;
    use chrono::{NaiveDate, NaiveDateTime};
    use exif::experimental::Writer;
    use exif::{Field, In, Tag, Value};
    use std::fs;
    use std::io::Cursor;
    use std::path::Path;
    use tempfile::tempdir;

    /// Writes a bare TIFF stream carrying only `DateTimeOriginal`.
    pub(crate) fn write_tiff_with_date(path: &Path, date: &str) {
        let field = Field {
            tag: Tag::DateTimeOriginal,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![date.as_bytes().to_vec()]),
        };
        let mut writer = Writer::new();
        writer.push_field(&field);
        let mut buf = Cursor::new(Vec::new());
        writer.write(&mut buf, false).expect("encode exif");
        fs::write(path, buf.into_inner()).expect("write tiff");
    }

    fn dt(h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .and_then(|v| v.and_hms_opt(h, mi, s))
            .expect("valid date")
    }

    struct FixedReader(Option<NaiveDateTime>);

    impl DateTakenReader for FixedReader {
        fn read_date_taken(&mut self, _path: &Path) -> Result<Option<NaiveDateTime>> {
            Ok(self.0)
        }
    }

    #[test]
    fn parse_exif_date_accepts_common_forms() {
        let expected = Some(dt(14, 30, 45));
        assert_eq!(parse_exif_date("2024:03:15 14:30:45"), expected);
        assert_eq!(parse_exif_date("2024:03:15 14:30:45\0"), expected);
        assert_eq!(parse_exif_date("2024-03-15 14:30:45"), expected);
        assert_eq!(parse_exif_date("2024-03-15T14:30:45+09:00"), expected);
        assert_eq!(parse_exif_date("2024-03-15T14:30:45.120"), Some(
            NaiveDate::from_ymd_opt(2024, 3, 15)
                .and_then(|v| v.and_hms_milli_opt(14, 30, 45, 120))
                .expect("valid date"),
        ));
        assert_eq!(parse_exif_date("0000:00:00 00:00:00"), None);
        assert_eq!(parse_exif_date(""), None);
    }

    #[test]
    fn format_family_is_case_insensitive() {
        assert_eq!(FormatFamily::from_extension("JPG"), Some(FormatFamily::Common));
        assert_eq!(FormatFamily::from_extension("Tif"), Some(FormatFamily::Common));
        assert_eq!(FormatFamily::from_extension("CR3"), Some(FormatFamily::Raw));
        assert_eq!(FormatFamily::from_extension("raf"), Some(FormatFamily::Raw));
        assert_eq!(FormatFamily::from_extension("gif"), None);
    }

    #[test]
    fn container_reader_finds_date_in_tiff() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("shot.tif");
        write_tiff_with_date(&path, "2024:03:15 14:30:45");

        let date = ContainerExifReader
            .read_date_taken(&path)
            .expect("readable file");
        assert_eq!(date, Some(dt(14, 30, 45)));
    }

    #[test]
    fn container_reader_returns_none_without_exif() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("plain.jpg");
        fs::write(&path, b"not really a jpeg").expect("write");

        let date = ContainerExifReader
            .read_date_taken(&path)
            .expect("readable file");
        assert_eq!(date, None);
    }

    #[test]
    fn container_reader_errors_on_missing_file() {
        let temp = tempdir().expect("tempdir");
        let err = ContainerExifReader
            .read_date_taken(&temp.path().join("gone.jpg"))
            .expect_err("missing file must fail");
        assert!(err.to_string().contains("Could not open file for EXIF"));
    }

    #[test]
    fn raw_reader_parses_tiff_based_raw_without_exiftool() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("DSC_0001.NEF");
        write_tiff_with_date(&path, "2024:03:15 08:00:01");

        let mut reader = RawExifReader::new(false);
        let date = reader.read_date_taken(&path).expect("readable file");
        assert_eq!(date, Some(dt(8, 0, 1)));
    }

    #[test]
    fn registry_dispatches_by_extension_family() {
        let temp = tempdir().expect("tempdir");
        let mut registry = ReaderRegistry::with_readers(
            Box::new(FixedReader(Some(dt(1, 1, 1)))),
            Box::new(FixedReader(Some(dt(2, 2, 2)))),
        );

        assert_eq!(
            registry
                .read_date_taken(&temp.path().join("a.JPEG"))
                .expect("common"),
            Some(dt(1, 1, 1))
        );
        assert_eq!(
            registry
                .read_date_taken(&temp.path().join("a.arw"))
                .expect("raw"),
            Some(dt(2, 2, 2))
        );
        assert_eq!(
            registry
                .read_date_taken(&temp.path().join("a.gif"))
                .expect("unsupported"),
            None
        );
    }
}
