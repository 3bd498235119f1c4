//! Engine operations, one module per concern.
//!
//! Every module adds methods to [`super::TaskGraphEngine`]:
//!
//! - [`lifecycle`]: task start and finish
//! - [`blocking`]: unattainable edge propagation
//! - [`rollup`]: build, version and patch status
//! - [`activation`]: scheduling, unscheduling and aborts
//! - [`reset`]: new executions of finished tasks
//! - [`stepback`]: regression hunting on earlier revisions
//! - [`task_group`]: single-host group sequencing
//! - [`display`]: display task aggregation
//! - [`dispatch`]: host assignment bookkeeping
//! - [`commit_queue`]: merge queue processing and failure handling
//! - [`version_setup`]: materialising a version from its definition

pub mod activation;
pub mod blocking;
pub mod commit_queue;
pub mod dispatch;
pub mod display;
pub mod lifecycle;
pub mod reset;
pub mod rollup;
pub mod stepback;
pub mod task_group;
pub mod version_setup;

pub use lifecycle::{MarkEndRequest, StatusChanges};
pub use reset::ResetRequest;
