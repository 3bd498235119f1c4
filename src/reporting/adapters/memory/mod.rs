//! In-memory reporter for tests and embedding.

mod recording;

pub use recording::RecordingStatusReporter;
