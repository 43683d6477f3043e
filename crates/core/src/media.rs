use crate::error::RenamerError;
use crate::exif_reader::FormatFamily;
use crate::timestamp::{TimestampExtractor, TimestampMode, TimestampOrigin};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// One candidate image and the timestamp resolved for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub path: PathBuf,
    /// Lowercase, without the dot.
    pub extension: String,
    pub timestamp: Option<NaiveDateTime>,
    pub origin: TimestampOrigin,
    /// Set when reading the timestamp failed with an I/O error.
    pub read_error: Option<String>,
}

impl MediaFile {
    pub fn read(path: PathBuf, extractor: &mut TimestampExtractor) -> Self {
        let extension = path
            .extension()
            .map(|v| v.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match extractor.extract(&path) {
            Ok(Some(timestamp)) => Self {
                origin: match extractor.mode() {
                    TimestampMode::Modified => TimestampOrigin::Modified,
                    TimestampMode::ExifDateTaken => TimestampOrigin::Exif,
                },
                path,
                extension,
                timestamp: Some(timestamp),
                read_error: None,
            },
            Ok(None) => Self {
                path,
                extension,
                timestamp: None,
                origin: TimestampOrigin::None,
                read_error: None,
            },
            Err(err) => {
                warn!("{err:#}");
                Self {
                    path,
                    extension,
                    timestamp: None,
                    origin: TimestampOrigin::None,
                    read_error: Some(format!("{err:#}")),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub scanned_files: usize,
    pub media_files: usize,
    pub skipped_unsupported: usize,
    pub skipped_hidden: usize,
}

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .map(|ext| FormatFamily::from_extension(&ext.to_string_lossy()).is_some())
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

/// Lists supported images under `root` in a stable (file name) order.
/// `root` may also be a single file.
pub fn collect_media_paths(root: &Path, recursive: bool) -> Result<(Vec<PathBuf>, ScanStats)> {
    if !root.exists() {
        return Err(RenamerError::PathNotFound(root.to_path_buf()).into());
    }
    let root = fs::canonicalize(root)
        .with_context(|| format!("Could not resolve path: {}", root.display()))?;

    let mut stats = ScanStats::default();
    let mut out = Vec::new();

    if root.is_file() {
        stats.scanned_files = 1;
        if is_supported(&root) {
            stats.media_files = 1;
            out.push(root);
        } else {
            stats.skipped_unsupported = 1;
        }
        return Ok((out, stats));
    }
    if !root.is_dir() {
        return Err(RenamerError::UnsupportedPath(root).into());
    }

    if recursive {
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("Failed to walk directory: {}", root.display()))?;
            if entry.file_type().is_dir() {
                continue;
            }
            consider(entry.path(), &mut out, &mut stats);
        }
    } else {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&root)
            .with_context(|| format!("Could not read directory: {}", root.display()))?
        {
            let entry =
                entry.with_context(|| format!("Failed to read entry in: {}", root.display()))?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            paths.push(path);
        }
        paths.sort();
        for path in paths {
            consider(&path, &mut out, &mut stats);
        }
    }

    Ok((out, stats))
}

fn consider(path: &Path, out: &mut Vec<PathBuf>, stats: &mut ScanStats) {
    stats.scanned_files += 1;
    if is_hidden(path) {
        stats.skipped_hidden += 1;
        return;
    }
    if is_supported(path) {
        stats.media_files += 1;
        out.push(path.to_path_buf());
    } else {
        stats.skipped_unsupported += 1;
    }
}

pub fn read_media_files(paths: Vec<PathBuf>, extractor: &mut TimestampExtractor) -> Vec<MediaFile> {
    paths
        .into_iter()
        .map(|path| MediaFile::read(path, extractor))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{collect_media_paths, is_supported, read_media_files, ScanStats};
    use crate::timestamp::{ExtractorConfig, TimestampExtractor, TimestampOrigin};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dirs must be creatable");
        }
        fs::write(path, b"x").expect("file must be creatable");
    }

    fn names(paths: &[std::path::PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().expect("name").to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn supported_extensions_are_case_insensitive() {
        assert!(is_supported(Path::new("a.JPG")));
        assert!(is_supported(Path::new("a.Rw2")));
        assert!(is_supported(Path::new("a.tiff")));
        assert!(!is_supported(Path::new("a.txt")));
        assert!(!is_supported(Path::new("jpg")));
    }

    #[test]
    fn non_recursive_scan_filters_and_sorts() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("b.jpg"));
        touch(&temp.path().join("a.NEF"));
        touch(&temp.path().join("notes.txt"));
        touch(&temp.path().join(".hidden.jpg"));
        touch(&temp.path().join("nested").join("c.jpg"));

        let (paths, stats) = collect_media_paths(temp.path(), false).expect("scan");
        assert_eq!(names(&paths), vec!["a.NEF", "b.jpg"]);
        assert_eq!(
            stats,
            ScanStats {
                scanned_files: 4,
                media_files: 2,
                skipped_unsupported: 1,
                skipped_hidden: 1,
            }
        );
    }

    #[test]
    fn recursive_scan_descends_into_subdirectories() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("a.jpg"));
        touch(&temp.path().join("nested").join("c.jpg"));

        let (paths, _) = collect_media_paths(temp.path(), true).expect("scan");
        assert_eq!(names(&paths), vec!["a.jpg", "c.jpg"]);
    }

    #[test]
    fn single_file_target_is_scanned_alone() {
        let temp = tempdir().expect("tempdir");
        let file = temp.path().join("a.png");
        touch(&file);
        touch(&temp.path().join("b.png"));

        let (paths, stats) = collect_media_paths(&file, false).expect("scan");
        assert_eq!(names(&paths), vec!["a.png"]);
        assert_eq!(stats.media_files, 1);
    }

    #[test]
    fn missing_root_is_a_path_error() {
        let temp = tempdir().expect("tempdir");
        let err = collect_media_paths(&temp.path().join("nope"), false)
            .expect_err("missing path must fail");
        assert!(err.to_string().contains("Path not found"));
    }

    #[test]
    fn read_media_files_keeps_order_and_origin() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("a.jpg"));
        touch(&temp.path().join("b.JPG"));

        let (paths, _) = collect_media_paths(temp.path(), false).expect("scan");
        let mut extractor = TimestampExtractor::new(&ExtractorConfig::default());
        let files = read_media_files(paths, &mut extractor);

        assert_eq!(files.len(), 2);
        assert_eq!(files[1].extension, "jpg");
        assert!(files
            .iter()
            .all(|f| f.timestamp.is_some() && f.origin == TimestampOrigin::Modified));
    }
}
