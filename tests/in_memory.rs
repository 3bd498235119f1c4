//! In-memory engine integration tests.
//!
//! Tests are organized into modules by functionality:
//! - `finish_tests`: repeated and unstarted finishes
//! - `blocking_tests`: unattainable edges across tasks and builds
//! - `commit_queue_tests`: queue ordering and the merge chain
//! - `stepback_tests`: activating earlier revisions after a failure

mod in_memory {
    pub mod helpers;

    mod blocking_tests;
    mod commit_queue_tests;
    mod finish_tests;
    mod stepback_tests;
}
