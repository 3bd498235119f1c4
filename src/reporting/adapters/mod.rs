//! Adapters for the reporting context.

pub mod memory;
mod tracing_reporter;

pub use tracing_reporter::TracingStatusReporter;
