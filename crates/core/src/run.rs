use crate::apply::{execute_plan, ExecutedPlan};
use crate::check::{check_files, MismatchReport};
use crate::exif_reader::ReaderRegistry;
use crate::media::{collect_media_paths, read_media_files, ScanStats};
use crate::oplog::{dry_run_log_path, write_operation_log};
use crate::planner::{build_plan, PlanOptions, RunSummary};
use crate::timestamp::{ExtractorConfig, TimestampExtractor};
use anyhow::Result;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RenameRequest {
    pub target: PathBuf,
    pub extractor: ExtractorConfig,
    pub recursive: bool,
    pub plan: PlanOptions,
    /// Write the operation log here when set. Dry runs write to the
    /// `dry_run_log_path` sibling instead.
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum LogWrite {
    Written(PathBuf),
    Failed { path: PathBuf, error: String },
}

#[derive(Debug, Clone)]
pub struct RenameOutcome {
    pub executed: ExecutedPlan,
    pub summary: RunSummary,
    pub scan: ScanStats,
    pub log: Option<LogWrite>,
}

/// Scan, extract, plan, execute and log in one pass.
///
/// Only path errors abort; everything per-file ends up in the plan.
pub fn run_rename(request: &RenameRequest) -> Result<RenameOutcome> {
    let (paths, scan) = collect_media_paths(&request.target, request.recursive)?;
    info!(
        "scanned {} files, {} supported images",
        scan.scanned_files, scan.media_files
    );

    let mut extractor = TimestampExtractor::new(&request.extractor);
    let files = read_media_files(paths, &mut extractor);
    let plan = build_plan(&files, &request.plan)?;
    let executed = execute_plan(plan, request.plan.dry_run);
    let summary = executed.summary();

    let log = request.log_file.as_ref().map(|path| {
        let path = if request.plan.dry_run {
            dry_run_log_path(path)
        } else {
            path.clone()
        };
        match write_operation_log(&executed.operations, &path) {
            Ok(()) => LogWrite::Written(path),
            Err(err) => {
                warn!("{err:#}");
                LogWrite::Failed {
                    path,
                    error: format!("{err:#}"),
                }
            }
        }
    });

    Ok(RenameOutcome {
        executed,
        summary,
        scan,
        log,
    })
}

#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub target: PathBuf,
    pub recursive: bool,
    pub use_exiftool: bool,
    pub tolerance_secs: i64,
}

pub fn run_check(request: &CheckRequest) -> Result<MismatchReport> {
    let (paths, _) = collect_media_paths(&request.target, request.recursive)?;
    let mut readers = ReaderRegistry::new(request.use_exiftool);
    Ok(check_files(&paths, &mut readers, request.tolerance_secs))
}
