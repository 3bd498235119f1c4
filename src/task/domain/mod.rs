//! Domain model for task documents.
//!
//! Tasks carry their own lifecycle status, activation, dependency edges and
//! group memberships. Cross-document consequences of a change live in the
//! engine services; nothing here touches persistence.

mod detail;
mod error;
mod ids;
mod requester;
mod status;
mod task;

pub use detail::{
    ABORTED_DESCRIPTION, AbortInfo, Dependency, EXECUTION_CAP_DESCRIPTION, FAILED_TESTS_DESCRIPTION,
    HostAssignment, NO_RESULTS_DESCRIPTION, TaskEndDetail,
};
pub use error::{ParseRequiredStatusError, ParseTaskStatusError, TaskDomainError};
pub use ids::{BuildId, ProjectId, TaskId, VersionId};
pub use requester::{Activator, Requester, ResetOrigin};
pub use status::{RequiredStatus, TaskStatus};
pub use task::{DisplayRollup, Task, TaskDefinition, TaskGroupMembership, TaskRunKey};
