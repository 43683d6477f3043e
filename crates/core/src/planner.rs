use crate::error::SkipReason;
use crate::media::MediaFile;
use crate::naming::{format_timestamp, target_file_name};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_COLLISION_LIMIT: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanOptions {
    pub safe: bool,
    pub dry_run: bool,
    pub collision_limit: u32,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            safe: false,
            dry_run: false,
            collision_limit: DEFAULT_COLLISION_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Planned,
    Applied,
    Skipped,
    CollisionResolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOperation {
    pub source: PathBuf,
    /// For skipped operations: the target that was attempted, or the
    /// source when no candidate could be computed.
    pub target: PathBuf,
    pub status: OperationStatus,
    pub reason: Option<SkipReason>,
    /// Counter suffix used, 0 when the plain name was free.
    pub counter: u32,
}

impl RenameOperation {
    fn skipped(source: &Path, target: PathBuf, reason: SkipReason) -> Self {
        Self {
            source: source.to_path_buf(),
            target,
            status: OperationStatus::Skipped,
            reason: Some(reason),
            counter: 0,
        }
    }

    /// Still waiting to be (or simulated as being) renamed.
    pub fn is_pending(&self) -> bool {
        matches!(
            self.status,
            OperationStatus::Planned | OperationStatus::CollisionResolved
        )
    }

    pub fn mark_skipped(&mut self, reason: SkipReason) {
        self.status = OperationStatus::Skipped;
        self.reason = Some(reason);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamePlan {
    pub operations: Vec<RenameOperation>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub applied: usize,
    /// Operations still pending, i.e. what a dry run would apply.
    pub planned: usize,
    pub skipped: usize,
    pub collision_resolved: usize,
    pub failed: usize,
    pub dry_run: bool,
}

impl RunSummary {
    pub fn from_operations(operations: &[RenameOperation], dry_run: bool) -> Self {
        let mut summary = RunSummary {
            dry_run,
            ..RunSummary::default()
        };
        for op in operations {
            match op.status {
                OperationStatus::Applied => summary.applied += 1,
                OperationStatus::Planned | OperationStatus::CollisionResolved => {
                    summary.planned += 1
                }
                OperationStatus::Skipped => {
                    summary.skipped += 1;
                    if op.reason.as_ref().is_some_and(SkipReason::is_failure) {
                        summary.failed += 1;
                    }
                }
            }
            if op.status != OperationStatus::Skipped && op.counter > 0 {
                summary.collision_resolved += 1;
            }
        }
        summary
    }
}

impl RenamePlan {
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_operations(&self.operations, self.dry_run)
    }
}

/// Paths that a new name must not take, shared per directory.
#[derive(Debug, Clone, Default)]
pub struct ClaimedTargets {
    claimed: HashSet<PathBuf>,
}

impl ClaimedTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds every entry of the directories the files live in, except the
    /// files themselves: their current names are released when they move.
    pub fn from_directories(files: &[MediaFile]) -> Result<Self> {
        let sources: HashSet<&Path> = files.iter().map(|f| f.path.as_path()).collect();
        let dirs: BTreeSet<&Path> = files.iter().filter_map(|f| f.path.parent()).collect();

        let mut claims = Self::new();
        for dir in dirs {
            for entry in fs::read_dir(dir)
                .with_context(|| format!("Could not read directory: {}", dir.display()))?
            {
                let entry =
                    entry.with_context(|| format!("Failed to read entry in: {}", dir.display()))?;
                let path = entry.path();
                if !sources.contains(path.as_path()) {
                    claims.claimed.insert(path);
                }
            }
        }
        Ok(claims)
    }

    /// Returns false when the path was already taken.
    pub fn claim(&mut self, path: PathBuf) -> bool {
        self.claimed.insert(path)
    }

    pub fn is_claimed(&self, path: &Path) -> bool {
        self.claimed.contains(path)
    }
}

struct TargetName {
    parent: PathBuf,
    base: String,
    extension: String,
}

impl TargetName {
    fn path(&self, counter: u32) -> PathBuf {
        self.parent.join(target_file_name(&self.base, &self.extension, counter))
    }
}

enum Candidate {
    Skip(SkipReason),
    Target(TargetName),
}

impl Candidate {
    fn for_file(file: &MediaFile) -> Self {
        if let Some(err) = &file.read_error {
            return Candidate::Skip(SkipReason::ReadFailed(err.clone()));
        }
        let Some(timestamp) = file.timestamp else {
            return Candidate::Skip(SkipReason::NoTimestamp);
        };
        Candidate::Target(TargetName {
            parent: file
                .path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf(),
            base: format_timestamp(&timestamp),
            extension: file
                .path
                .extension()
                .map(|v| v.to_string_lossy().to_string())
                .unwrap_or_default(),
        })
    }

    /// The file keeps its current name after this run.
    fn stays(&self, source: &Path) -> bool {
        match self {
            Candidate::Skip(_) => true,
            Candidate::Target(name) => name.path(0) == source,
        }
    }
}

/// Builds the plan against the files' real directories.
pub fn build_plan(files: &[MediaFile], options: &PlanOptions) -> Result<RenamePlan> {
    let claims = ClaimedTargets::from_directories(files)?;
    Ok(build_plan_with_claims(files, options, claims))
}

/// Scan order decides ties: earlier files get the plain name, later ones
/// `_001`, `_002`, ... in turn.
///
/// A file can turn out to stay put only once it is resolved, after an
/// earlier file was already given its name. Its name then joins the seed
/// claims and the pass is repeated until every staying file holds its name.
pub fn build_plan_with_claims(
    files: &[MediaFile],
    options: &PlanOptions,
    mut claims: ClaimedTargets,
) -> RenamePlan {
    let candidates: Vec<Candidate> = files.iter().map(Candidate::for_file).collect();

    // Files that will not move keep holding their names.
    for (file, candidate) in files.iter().zip(&candidates) {
        if candidate.stays(&file.path) {
            claims.claim(file.path.clone());
        }
    }

    let operations = loop {
        let mut pass = claims.clone();
        let operations: Vec<RenameOperation> = files
            .iter()
            .zip(&candidates)
            .map(|(file, candidate)| resolve(file, candidate, options, &mut pass))
            .collect();

        let stranded: Vec<PathBuf> = {
            let given: HashSet<&Path> = operations
                .iter()
                .filter(|op| op.is_pending())
                .map(|op| op.target.as_path())
                .collect();
            operations
                .iter()
                .filter(|op| op.status == OperationStatus::Skipped)
                .filter(|op| given.contains(op.source.as_path()))
                .map(|op| op.source.clone())
                .collect()
        };
        if stranded.is_empty() {
            break operations;
        }
        for source in stranded {
            debug!("{} stays, replanning around it", source.display());
            claims.claim(source);
        }
    };

    for op in &operations {
        debug!(
            "plan {} -> {} ({:?}{})",
            op.source.display(),
            op.target.display(),
            op.status,
            op.reason
                .as_ref()
                .map(|r| format!(": {r}"))
                .unwrap_or_default()
        );
    }

    RenamePlan {
        operations,
        dry_run: options.dry_run,
    }
}

fn resolve(
    file: &MediaFile,
    candidate: &Candidate,
    options: &PlanOptions,
    claims: &mut ClaimedTargets,
) -> RenameOperation {
    let source = file.path.as_path();
    let name = match candidate {
        Candidate::Skip(reason) => {
            return RenameOperation::skipped(source, source.to_path_buf(), reason.clone())
        }
        Candidate::Target(name) => name,
    };
    let target = name.path(0);

    if target == source {
        return RenameOperation::skipped(source, target, SkipReason::AlreadyNamed);
    }
    if claims.claim(target.clone()) {
        return RenameOperation {
            source: source.to_path_buf(),
            target,
            status: OperationStatus::Planned,
            reason: None,
            counter: 0,
        };
    }
    if !options.safe {
        claims.claim(source.to_path_buf());
        return RenameOperation::skipped(source, target, SkipReason::SafeModeDisabled);
    }

    for counter in 1..=options.collision_limit {
        let probe = name.path(counter);
        if probe == source && !claims.is_claimed(&probe) {
            claims.claim(probe.clone());
            return RenameOperation::skipped(source, probe, SkipReason::AlreadyNamed);
        }
        if claims.claim(probe.clone()) {
            return RenameOperation {
                source: source.to_path_buf(),
                target: probe,
                status: OperationStatus::CollisionResolved,
                reason: None,
                counter,
            };
        }
    }

    claims.claim(source.to_path_buf());
    RenameOperation::skipped(source, target, SkipReason::CollisionLimit)
}
