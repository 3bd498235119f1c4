//! Buildgraph: the runtime task-graph core of a continuous integration
//! system.
//!
//! Tasks are grouped into builds, builds into versions, and patch versions
//! carry a patch document. This crate decides when a task may run, moves
//! tasks through their lifecycle, propagates blocked dependencies, rolls
//! status up from tasks to builds, versions and patches, steps back through
//! earlier revisions to find regressions, sequences single-host task groups
//! and keeps the per-project commit queue merging in order.
//!
//! # Architecture
//!
//! Each document kind follows hexagonal architecture principles:
//!
//! - **Domain**: documents and their local rules, no infrastructure
//! - **Ports**: abstract repository and collaborator traits
//! - **Adapters**: in-memory implementations of the ports
//!
//! The [`engine`] composes the ports and implements every operation that
//! spans documents.
//!
//! # Modules
//!
//! - [`task`]: task documents, statuses and dependency edges
//! - [`rollup`]: builds, versions, patches and status derivation
//! - [`commit_queue`]: the per-project merge queue
//! - [`project`]: resolved project policy and version definitions
//! - [`reporting`]: outbound status notifications
//! - [`engine`]: cross-document operations
//! - [`config`]: engine tunables
//! - [`logging`]: `tracing` subscriber setup

pub mod commit_queue;
pub mod config;
pub mod engine;
pub mod logging;
pub mod project;
pub mod reporting;
pub mod rollup;
pub mod task;
