use crate::output as out;
use anyhow::Result;
use clap::ValueEnum;
use date_renamer_core::{
    log_path_for, run_check, run_rename, undo_from_log, AppConfig, CheckRequest, ExtractorConfig,
    LogWrite, MismatchOutcome, OperationStatus, PlanOptions, RenameOperation, RenameOutcome,
    RenameRequest, TimestampMode,
};
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Per-run switches. The interactive menu toggles these in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    pub dry_run: bool,
    pub safe: bool,
    pub log: bool,
    pub verbose: bool,
    pub recursive: bool,
}

impl Settings {
    /// Config defaults with any flag given on the command line switched on.
    pub fn merged(config: &AppConfig, flags: Settings) -> Self {
        Self {
            dry_run: config.dry_run || flags.dry_run,
            safe: config.safe || flags.safe,
            log: config.log || flags.log,
            verbose: config.verbose || flags.verbose,
            recursive: config.recursive || flags.recursive,
        }
    }

    pub fn apply_to(&self, config: &AppConfig) -> AppConfig {
        AppConfig {
            dry_run: self.dry_run,
            safe: self.safe,
            log: self.log,
            verbose: self.verbose,
            recursive: self.recursive,
            ..config.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub target: PathBuf,
    pub settings: Settings,
    pub config: AppConfig,
    pub format: OutputFormat,
}

impl Session {
    fn log_path(&self) -> PathBuf {
        log_path_for(&self.target, &self.config.log_file_name)
    }
}

pub fn rename(session: &Session, mode: TimestampMode) -> Result<RenameOutcome> {
    let settings = session.settings;
    let request = RenameRequest {
        target: session.target.clone(),
        extractor: ExtractorConfig {
            mode,
            use_exiftool: session.config.use_exiftool,
        },
        recursive: settings.recursive,
        plan: PlanOptions {
            safe: settings.safe,
            dry_run: settings.dry_run,
            collision_limit: session.config.collision_limit,
        },
        log_file: settings.log.then(|| session.log_path()),
    };

    let outcome = run_rename(&request)?;
    match session.format {
        OutputFormat::Json => {
            let (log, log_error) = match &outcome.log {
                Some(LogWrite::Written(path)) => (Some(path.display().to_string()), None),
                Some(LogWrite::Failed { error, .. }) => (None, Some(error.clone())),
                None => (None, None),
            };
            let body = json!({
                "operations": &outcome.executed.operations,
                "summary": outcome.summary,
                "scan": &outcome.scan,
                "log": log,
                "log_error": log_error,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Table => {
            for op in &outcome.executed.operations {
                print_operation(op, mode, settings.verbose);
            }
            print_summary(&outcome);
            if let Some(LogWrite::Failed { path, error }) = &outcome.log {
                out::print_error(&format!("Could not write log {}: {error}", path.display()));
            }
        }
    }
    Ok(outcome)
}

fn date_label(mode: TimestampMode) -> &'static str {
    match mode {
        TimestampMode::Modified => "modified",
        TimestampMode::ExifDateTaken => "Date Taken",
    }
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_operation(op: &RenameOperation, mode: TimestampMode, verbose: bool) {
    let line = format!(
        "{} -> {} ({} date)",
        name_of(&op.source),
        name_of(&op.target),
        date_label(mode)
    );
    match op.status {
        OperationStatus::Applied => out::print_success(&format!("Renamed: {line}")),
        OperationStatus::Planned | OperationStatus::CollisionResolved => {
            out::print_dry_run(&format!("Would rename: {line}"))
        }
        OperationStatus::Skipped => {
            let Some(reason) = &op.reason else {
                return;
            };
            if reason.is_warning() {
                out::print_warn(&format!("{}: {reason}", name_of(&op.source)));
            } else if verbose {
                out::print_verbose(&format!("{}: {reason}", name_of(&op.source)));
            }
        }
    }
}

fn print_summary(outcome: &RenameOutcome) {
    if outcome.scan.skipped_hidden > 0 {
        out::print_warn(&format!(
            "{} hidden file(s) ignored",
            outcome.scan.skipped_hidden
        ));
    }
    if outcome.executed.operations.is_empty() {
        out::print_user(&format!(
            "{} no supported images found ({} files scanned)",
            out::heading("Summary:"),
            outcome.scan.scanned_files
        ));
        return;
    }

    let s = outcome.summary;
    let first = if s.dry_run {
        format!("would apply {}", s.planned)
    } else {
        format!("applied {}", s.applied)
    };
    out::print_user(&format!(
        "{} {first}, skipped {}, collision-resolved {}, failed {}",
        out::heading("Summary:"),
        s.skipped,
        s.collision_resolved,
        s.failed
    ));
    if let Some(LogWrite::Written(path)) = &outcome.log {
        out::print_user(&format!("Log written to {}", path.display()));
    }
}

pub fn check(session: &Session) -> Result<()> {
    let report = run_check(&CheckRequest {
        target: session.target.clone(),
        recursive: session.settings.recursive,
        use_exiftool: session.config.use_exiftool,
        tolerance_secs: session.config.mismatch_tolerance_secs,
    })?;

    if session.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let verbose = session.settings.verbose;
    for entry in &report.entries {
        let name = name_of(&entry.path);
        match &entry.outcome {
            MismatchOutcome::Mismatch {
                filename_date,
                exif_date,
            } => {
                out::print_mismatch(&name);
                out::print_user(&format!(
                    "    Filename date: {}",
                    filename_date.format("%Y-%m-%d %H:%M:%S")
                ));
                out::print_user(&format!(
                    "    Date Taken:    {}",
                    exif_date.format("%Y-%m-%d %H:%M:%S")
                ));
            }
            MismatchOutcome::Match { .. } if verbose => {
                out::print_match(&format!("{name} (dates match)"))
            }
            MismatchOutcome::Match { .. } => {}
            MismatchOutcome::NoExifDate => {
                out::print_warn(&format!("{name}: No Date Taken found in metadata"))
            }
            MismatchOutcome::UnparseableName if verbose => {
                out::print_verbose(&format!("{name}: Cannot parse date from filename"))
            }
            MismatchOutcome::UnparseableName => {}
            MismatchOutcome::ReadFailed { reason } => {
                out::print_warn(&format!("{name}: {reason}"))
            }
        }
    }

    out::print_user(&format!("\n{}", out::heading("Summary:")));
    out::print_user(&format!("  Images checked: {}", report.checked));
    out::print_user(&format!("  Mismatches found: {}", report.mismatches));
    Ok(())
}

pub fn undo(session: &Session) -> Result<()> {
    let result = undo_from_log(&session.log_path())?;
    out::print_success(&format!("Restored {} file(s)", result.restored));
    if result.skipped > 0 {
        out::print_warn(&format!(
            "{} logged rename(s) could not be reverted and stay in {}",
            result.skipped,
            session.log_path().display()
        ));
    }
    Ok(())
}
