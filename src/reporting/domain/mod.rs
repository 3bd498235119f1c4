//! Status report values.

mod report;

pub use report::{ExternalStatus, StatusReport};
