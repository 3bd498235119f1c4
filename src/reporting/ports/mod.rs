//! Port contracts for outbound status notifications.

pub mod reporter;

pub use reporter::{StatusReporter, StatusReporterError, StatusReporterResult};

#[cfg(test)]
pub use reporter::MockStatusReporter;
