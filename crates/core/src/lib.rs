mod apply;
mod check;
mod config;
mod error;
mod exif_reader;
mod media;
mod naming;
mod oplog;
mod planner;
mod run;
mod timestamp;

pub use apply::{execute_plan, ExecutedPlan};
pub use check::{
    check_file, check_files, MismatchEntry, MismatchOutcome, MismatchReport,
    DEFAULT_TOLERANCE_SECS,
};
pub use config::{
    app_paths, load_config, load_config_from, save_config, save_config_to, AppConfig, AppPaths,
    CONFIG_ENV_VAR,
};
pub use error::{RenamerError, SkipReason};
pub use exif_reader::{
    parse_exif_date, ContainerExifReader, DateTakenReader, FormatFamily, RawExifReader,
    ReaderRegistry, COMMON_EXTENSIONS, RAW_EXTENSIONS,
};
pub use media::{collect_media_paths, is_supported, read_media_files, MediaFile, ScanStats};
pub use naming::{format_timestamp, parse_filename_date, target_file_name};
pub use oplog::{
    dry_run_log_path, log_path_for, read_operation_log, undo_from_log, write_operation_log,
    LogEntry, UndoResult, DEFAULT_LOG_FILE_NAME,
};
pub use planner::{
    build_plan, build_plan_with_claims, ClaimedTargets, OperationStatus, PlanOptions,
    RenameOperation, RenamePlan, RunSummary, DEFAULT_COLLISION_LIMIT,
};
pub use run::{run_check, run_rename, CheckRequest, LogWrite, RenameOutcome, RenameRequest};
pub use timestamp::{
    modified_time, ExtractorConfig, TimestampExtractor, TimestampMode, TimestampOrigin,
};
