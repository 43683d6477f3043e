use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures that abort a run before any file is touched.
#[derive(Debug, Error)]
pub enum RenamerError {
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Path is neither a file nor a directory: {0}")]
    UnsupportedPath(PathBuf),

    #[error("No operation log at {0}")]
    LogNotFound(PathBuf),
}

/// Why an operation was left out of the rename pass.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("no timestamp available")]
    NoTimestamp,
    #[error("collision, safe mode disabled")]
    SafeModeDisabled,
    #[error("collision limit exceeded")]
    CollisionLimit,
    #[error("already correctly named")]
    AlreadyNamed,
    #[error("target already exists")]
    TargetOccupied,
    #[error("failed to read timestamp: {0}")]
    ReadFailed(String),
    #[error("rename failed: {0}")]
    WriteFailed(String),
}

impl SkipReason {
    /// Reasons that deserve a warning rather than a verbose-only note.
    pub fn is_warning(&self) -> bool {
        !matches!(self, SkipReason::AlreadyNamed)
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            SkipReason::ReadFailed(_) | SkipReason::WriteFailed(_) | SkipReason::TargetOccupied
        )
    }
}
