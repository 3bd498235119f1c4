//! Pure status derivation.
//!
//! Each function folds over the whole child set before deciding, so the
//! result does not depend on the order children are listed in.
//!
//! ```
//! use buildgraph::rollup::domain::{derive, BuildStatus};
//!
//! assert_eq!(derive::build_status(&[]), (BuildStatus::Created, true));
//! ```

use super::{BuildSnapshot, BuildStatus, VersionStatus};
use crate::task::domain::{Task, TaskStatus};

#[derive(Default)]
struct TaskFlags {
    any_left_unstarted: bool,
    any_unblocked: bool,
    any_running: bool,
    any_failed_or_aborted: bool,
}

/// Derives a build's status from its tasks.
///
/// Returns the status and whether every task is blocked. In priority order:
/// `created` when no task left its initial state or every task is blocked;
/// `started` when a task is running or an activated unblocked task is
/// unfinished; `failed` on any failing status or abort; else `succeeded`.
#[must_use]
pub fn build_status(tasks: &[Task]) -> (BuildStatus, bool) {
    let flags = tasks.iter().fold(TaskFlags::default(), |mut flags, task| {
        let blocked = task.blocked();
        flags.any_left_unstarted |= !task.status().is_unstarted();
        flags.any_unblocked |= !blocked;
        flags.any_running |= task.status() == TaskStatus::Started
            || (task.activated() && !blocked && !task.is_finished());
        flags.any_failed_or_aborted |= task.status().is_failure() || task.aborted();
        flags
    });

    let no_started = !flags.any_left_unstarted;
    let all_blocked = no_started && !flags.any_unblocked;
    if no_started || all_blocked {
        return (BuildStatus::Created, all_blocked);
    }
    if flags.any_running {
        return (BuildStatus::Started, false);
    }
    if flags.any_failed_or_aborted {
        return (BuildStatus::Failed, false);
    }
    (BuildStatus::Succeeded, false)
}

/// Derives a version's status from its builds, using the same ranking as
/// [`build_status`] over build activation, finished state and blocking.
#[must_use]
pub fn version_status(builds: &[BuildSnapshot]) -> VersionStatus {
    if builds
        .iter()
        .all(|build| build.status == BuildStatus::Created)
    {
        return VersionStatus::Created;
    }
    if builds
        .iter()
        .any(|build| build.activated && !build.status.is_finished() && !build.all_tasks_blocked)
    {
        return VersionStatus::Started;
    }
    if builds
        .iter()
        .any(|build| build.status == BuildStatus::Failed || build.aborted)
    {
        return VersionStatus::Failed;
    }
    VersionStatus::Succeeded
}

/// Returns `true` when a build whose status just changed counts as aborted:
/// some task was aborted and no task that was not aborted failed.
#[must_use]
pub fn build_aborted(tasks: &[Task]) -> bool {
    let any_aborted = tasks.iter().any(Task::aborted);
    let any_failed = tasks
        .iter()
        .filter(|task| !task.aborted())
        .any(|task| task.status().is_failure());
    any_aborted && !any_failed
}

/// Returns `true` when any build in the version was aborted.
#[must_use]
pub fn version_aborted(builds: &[BuildSnapshot]) -> bool {
    builds.iter().any(|build| build.aborted)
}
