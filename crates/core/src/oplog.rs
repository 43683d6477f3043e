use crate::apply::execute_plan;
use crate::error::RenamerError;
use crate::planner::{OperationStatus, RenameOperation, RenamePlan};
use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_LOG_FILE_NAME: &str = "rename_log.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub source: PathBuf,
    pub target: PathBuf,
    pub status: OperationStatus,
    pub reason: Option<String>,
    #[serde(default)]
    pub counter: u32,
    /// When the entry was written, RFC 3339 local time.
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoResult {
    pub restored: usize,
    pub skipped: usize,
}

/// Where the log goes for a run on `target`: inside it when it is a
/// directory, next to it when it is a file.
pub fn log_path_for(target: &Path, file_name: &str) -> PathBuf {
    if target.is_dir() {
        target.join(file_name)
    } else {
        target
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(file_name)
    }
}

/// Overwrites `destination` with every operation of the run.
pub fn write_operation_log(operations: &[RenameOperation], destination: &Path) -> Result<()> {
    let timestamp = Local::now().to_rfc3339();
    let entries: Vec<LogEntry> = operations
        .iter()
        .map(|op| LogEntry {
            source: op.source.clone(),
            target: op.target.clone(),
            status: op.status,
            reason: op.reason.as_ref().map(ToString::to_string),
            counter: op.counter,
            timestamp: timestamp.clone(),
        })
        .collect();
    write_entries(&entries, destination)
}

fn write_entries(entries: &[LogEntry], destination: &Path) -> Result<()> {
    let body =
        serde_json::to_string_pretty(entries).context("Failed to serialize the operation log")?;
    fs::write(destination, body).with_context(|| {
        format!(
            "Failed to write operation log: {}",
            destination.display()
        )
    })?;
    debug!("wrote {} log entries to {}", entries.len(), destination.display());
    Ok(())
}

/// Sibling of `path` used for dry runs, so a preview never replaces the log
/// of a real run: `rename_log.json` becomes `rename_log.dry-run.json`.
pub fn dry_run_log_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| "rename_log".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{stem}.dry-run.{}", ext.to_string_lossy()),
        None => format!("{stem}.dry-run"),
    };
    path.with_file_name(name)
}

pub fn read_operation_log(path: &Path) -> Result<Vec<LogEntry>> {
    if !path.exists() {
        return Err(RenamerError::LogNotFound(path.to_path_buf()).into());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Could not read operation log: {}", path.display()))?;
    serde_json::from_str::<Vec<LogEntry>>(&raw)
        .with_context(|| format!("Operation log is corrupt: {}", path.display()))
}

/// Reverts the applied entries of a log.
///
/// The reverse renames go through the plan executor, so chains and swaps
/// are unwound whatever order they were applied in. The log is removed
/// once everything is restored; otherwise it is rewritten with the entries
/// still outstanding.
pub fn undo_from_log(path: &Path) -> Result<UndoResult> {
    let entries = read_operation_log(path)?;
    let mut result = UndoResult {
        restored: 0,
        skipped: 0,
    };

    let mut operations = Vec::new();
    let mut outstanding: HashSet<PathBuf> = HashSet::new();
    for entry in entries
        .iter()
        .rev()
        .filter(|e| e.status == OperationStatus::Applied)
    {
        if fs::symlink_metadata(&entry.target).is_err() {
            warn!("not restoring {}: file is gone", entry.target.display());
            result.skipped += 1;
            outstanding.insert(entry.target.clone());
            continue;
        }
        operations.push(RenameOperation {
            source: entry.target.clone(),
            target: entry.source.clone(),
            status: OperationStatus::Planned,
            reason: None,
            counter: 0,
        });
    }

    let executed = execute_plan(
        RenamePlan {
            operations,
            dry_run: false,
        },
        false,
    );
    for op in &executed.operations {
        if op.status == OperationStatus::Applied {
            result.restored += 1;
            continue;
        }
        if let Some(reason) = &op.reason {
            warn!("not restoring {}: {reason}", op.source.display());
        }
        result.skipped += 1;
        outstanding.insert(op.source.clone());
    }

    if outstanding.is_empty() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove operation log: {}", path.display()))?;
    } else {
        let remaining: Vec<LogEntry> = entries
            .into_iter()
            .filter(|e| e.status == OperationStatus::Applied && outstanding.contains(&e.target))
            .collect();
        write_entries(&remaining, path)?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::{
        dry_run_log_path, log_path_for, read_operation_log, undo_from_log, write_operation_log,
    };
    use crate::apply::execute_plan;
    use crate::error::SkipReason;
    use crate::planner::{OperationStatus, RenameOperation, RenamePlan};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn planned(source: PathBuf, target: PathBuf) -> RenameOperation {
        RenameOperation {
            source,
            target,
            status: OperationStatus::Planned,
            reason: None,
            counter: 0,
        }
    }

    /// Runs the renames for real and logs them next to the files.
    fn run_and_log(dir: &Path, operations: Vec<RenameOperation>) -> PathBuf {
        let executed = execute_plan(
            RenamePlan {
                operations,
                dry_run: false,
            },
            false,
        );
        assert!(executed
            .operations
            .iter()
            .all(|op| op.status == OperationStatus::Applied));
        let log = dir.join("rename_log.json");
        write_operation_log(&executed.operations, &log).expect("write log");
        log
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).expect("read file")
    }

    #[test]
    fn log_lands_inside_directory_or_next_to_file() {
        let temp = tempdir().expect("tempdir");
        let file = temp.path().join("a.jpg");
        fs::write(&file, b"x").expect("write");

        assert_eq!(
            log_path_for(temp.path(), "rename_log.json"),
            temp.path().join("rename_log.json")
        );
        assert_eq!(
            log_path_for(&file, "rename_log.json"),
            temp.path().join("rename_log.json")
        );
    }

    #[test]
    fn writes_every_operation_with_reasons_and_overwrites() {
        let temp = tempdir().expect("tempdir");
        let log = temp.path().join("rename_log.json");
        fs::write(&log, "stale").expect("write stale log");

        let operations = vec![
            RenameOperation {
                source: temp.path().join("a.jpg"),
                target: temp.path().join("2024-03-15 14-30-45.jpg"),
                status: OperationStatus::Applied,
                reason: None,
                counter: 0,
            },
            RenameOperation {
                source: temp.path().join("b.jpg"),
                target: temp.path().join("2024-03-15 14-30-45.jpg"),
                status: OperationStatus::Skipped,
                reason: Some(SkipReason::SafeModeDisabled),
                counter: 0,
            },
        ];
        write_operation_log(&operations, &log).expect("write log");

        let raw = fs::read_to_string(&log).expect("read log");
        assert!(raw.contains("\"status\": \"skipped\""));
        assert!(raw.contains("collision, safe mode disabled"));

        let entries = read_operation_log(&log).expect("parse log");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].status, OperationStatus::Applied);
        assert_eq!(entries[0].reason, None);
        assert!(!entries[0].timestamp.is_empty());
    }

    #[test]
    fn missing_log_is_reported() {
        let temp = tempdir().expect("tempdir");
        let err = read_operation_log(&temp.path().join("rename_log.json"))
            .expect_err("missing log must fail");
        assert!(err.to_string().contains("No operation log"));
    }

    #[test]
    fn undo_restores_applied_entries_only() {
        let temp = tempdir().expect("tempdir");
        let from_a = temp.path().join("a.jpg");
        let to_a = temp.path().join("x.jpg");
        let from_b = temp.path().join("b.jpg");
        let to_b = temp.path().join("y.jpg");
        fs::write(&to_a, b"A").expect("write renamed A");
        fs::write(&from_b, b"B").expect("write untouched B");

        let log = temp.path().join("rename_log.json");
        write_operation_log(
            &[
                RenameOperation {
                    source: from_a.clone(),
                    target: to_a.clone(),
                    status: OperationStatus::Applied,
                    reason: None,
                    counter: 0,
                },
                RenameOperation {
                    source: from_b.clone(),
                    target: to_b.clone(),
                    status: OperationStatus::Skipped,
                    reason: Some(SkipReason::CollisionLimit),
                    counter: 0,
                },
            ],
            &log,
        )
        .expect("write log");

        let result = undo_from_log(&log).expect("undo");
        assert_eq!(result.restored, 1);
        assert!(from_a.exists());
        assert!(!to_a.exists());
        assert!(from_b.exists());
        assert!(!log.exists());
    }

    #[test]
    fn undo_reverses_a_swap() {
        let temp = tempdir().expect("tempdir");
        let a = temp.path().join("a.jpg");
        let b = temp.path().join("b.jpg");
        fs::write(&a, "A").expect("write a");
        fs::write(&b, "B").expect("write b");
        let log = run_and_log(
            temp.path(),
            vec![planned(a.clone(), b.clone()), planned(b.clone(), a.clone())],
        );
        assert_eq!(read(&a), "B");

        let result = undo_from_log(&log).expect("undo");

        assert_eq!(result.restored, 2);
        assert_eq!(result.skipped, 0);
        assert_eq!(read(&a), "A");
        assert_eq!(read(&b), "B");
        assert!(!log.exists());
    }

    #[test]
    fn undo_reverses_a_chain() {
        let temp = tempdir().expect("tempdir");
        let a = temp.path().join("a.jpg");
        let b = temp.path().join("b.jpg");
        let c = temp.path().join("c.jpg");
        fs::write(&a, "A").expect("write a");
        fs::write(&b, "B").expect("write b");
        let log = run_and_log(
            temp.path(),
            vec![planned(a.clone(), b.clone()), planned(b.clone(), c.clone())],
        );
        assert_eq!(read(&c), "B");

        let result = undo_from_log(&log).expect("undo");

        assert_eq!(result.restored, 2);
        assert_eq!(read(&a), "A");
        assert_eq!(read(&b), "B");
        assert!(!c.exists());
    }

    #[test]
    fn blocked_restore_keeps_its_entry_in_the_log() {
        let temp = tempdir().expect("tempdir");
        let a = temp.path().join("a.jpg");
        let b = temp.path().join("b.jpg");
        fs::write(&a, "A").expect("write a");
        fs::write(&b, "B").expect("write b");
        let log = run_and_log(
            temp.path(),
            vec![
                planned(a.clone(), temp.path().join("x.jpg")),
                planned(b.clone(), temp.path().join("y.jpg")),
            ],
        );
        fs::write(&a, "new A").expect("write newcomer");

        let result = undo_from_log(&log).expect("undo");

        assert_eq!(result.restored, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(read(&a), "new A");
        assert_eq!(read(&temp.path().join("x.jpg")), "A");
        let left = read_operation_log(&log).expect("log kept");
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].source, a);
    }

    #[test]
    fn dry_run_log_gets_its_own_name() {
        assert_eq!(
            dry_run_log_path(Path::new("/photos/rename_log.json")),
            PathBuf::from("/photos/rename_log.dry-run.json")
        );
        assert_eq!(
            dry_run_log_path(Path::new("/photos/log")),
            PathBuf::from("/photos/log.dry-run")
        );
    }
}
