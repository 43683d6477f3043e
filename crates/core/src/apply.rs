use crate::error::SkipReason;
use crate::planner::{OperationStatus, RenameOperation, RenamePlan, RunSummary};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutedPlan {
    pub operations: Vec<RenameOperation>,
    pub dry_run: bool,
}

impl ExecutedPlan {
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_operations(&self.operations, self.dry_run)
    }
}

/// Applies a plan, or in dry-run just hands it back unchanged.
///
/// Renames run in plan order and never overwrite. An operation whose target
/// is still held by another file of the run waits until that file has
/// moved. A file that fails is skipped with the OS error and the rest carry
/// on; no target is ever reassigned.
pub fn execute_plan(plan: RenamePlan, dry_run: bool) -> ExecutedPlan {
    let mut operations = plan.operations;
    if !dry_run {
        apply_operations(&mut operations);
    }
    ExecutedPlan {
        operations,
        dry_run,
    }
}

fn apply_operations(operations: &mut [RenameOperation]) {
    let mut pending: Vec<usize> = operations
        .iter()
        .enumerate()
        .filter(|(_, op)| op.is_pending())
        .map(|(index, _)| index)
        .collect();
    // Where each pending file currently sits; differs from the source only
    // once it has been parked under a temporary name.
    let mut location: HashMap<usize, PathBuf> = pending
        .iter()
        .map(|&index| (index, operations[index].source.clone()))
        .collect();

    while !pending.is_empty() {
        let mut waiting = Vec::new();
        let mut progressed = false;
        for &index in &pending {
            if occupied(&operations[index].target) {
                waiting.push(index);
                continue;
            }
            progressed = true;
            finish(&mut operations[index], &location[&index]);
        }
        pending = waiting;
        if progressed || pending.is_empty() {
            continue;
        }

        let held: HashSet<PathBuf> = pending.iter().map(|i| location[i].clone()).collect();
        let (outside, inside): (Vec<usize>, Vec<usize>) = pending
            .iter()
            .partition(|&&i| !held.contains(&operations[i].target));
        if !outside.is_empty() {
            for index in outside {
                warn!(
                    "target appeared since planning: {}",
                    operations[index].target.display()
                );
                give_up(
                    &mut operations[index],
                    &location[&index],
                    SkipReason::TargetOccupied,
                );
            }
            pending = inside;
            continue;
        }

        // Only cycles are left: park one member to free its name.
        let parked = {
            let wanted: HashSet<&PathBuf> =
                pending.iter().map(|&i| &operations[i].target).collect();
            pending.iter().copied().find(|i| wanted.contains(&location[i]))
        };
        let Some(parked) = parked else {
            for index in pending.drain(..) {
                give_up(
                    &mut operations[index],
                    &location[&index],
                    SkipReason::TargetOccupied,
                );
            }
            break;
        };

        let from = location[&parked].clone();
        let temp = temp_path_for(&from, parked);
        match fs::rename(&from, &temp) {
            Ok(()) => {
                debug!("parked {} at {}", from.display(), temp.display());
                location.insert(parked, temp);
            }
            Err(err) => {
                warn!("could not park {}: {err}", from.display());
                operations[parked].mark_skipped(SkipReason::WriteFailed(err.to_string()));
                pending.retain(|&i| i != parked);
            }
        }
    }
}

fn finish(op: &mut RenameOperation, from: &Path) {
    match fs::rename(from, &op.target) {
        Ok(()) => {
            debug!("renamed {} -> {}", op.source.display(), op.target.display());
            op.status = OperationStatus::Applied;
        }
        Err(err) => {
            warn!(
                "rename failed: {} -> {}: {err}",
                op.source.display(),
                op.target.display()
            );
            give_up(op, from, SkipReason::WriteFailed(err.to_string()));
        }
    }
}

/// Marks the operation skipped, moving a parked file back to its source.
fn give_up(op: &mut RenameOperation, location: &Path, reason: SkipReason) {
    let reason = if location == op.source {
        reason
    } else {
        match fs::rename(location, &op.source) {
            Ok(()) => reason,
            Err(err) => SkipReason::WriteFailed(format!(
                "{reason}; could not restore ({err}), file left at {}",
                location.display()
            )),
        }
    };
    op.mark_skipped(reason);
}

fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn temp_path_for(original_path: &Path, index: usize) -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let parent = original_path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = original_path
        .file_name()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    parent.join(format!(".date_renamer_tmp_{}_{}_{}", now, index, file_name))
}
