//! Engine configuration.
//!
//! Every field has a default, so a partial JSON document is a valid
//! configuration:
//!
//! ```
//! use buildgraph::config::{EngineConfig, TaskGroupReconciliation};
//!
//! let config = EngineConfig::from_json_str(r#"{"max_task_execution": 5}"#)?;
//! assert_eq!(config.max_task_execution, 5);
//! assert_eq!(config.task_group_reconciliation, TaskGroupReconciliation::Repair);
//! # Ok::<(), buildgraph::config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// What to do with a single-host group member that is still blocked on a
/// sibling right after the whole group was reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskGroupReconciliation {
    /// Clear the stale edge and log a warning.
    #[default]
    Repair,
    /// Log the inconsistency and leave the edge as it is.
    Report,
}

/// Tunables for the task graph engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Executions after which automated resets stop.
    pub max_task_execution: u32,
    /// Engine operations slower than this are logged at `warn`.
    pub slow_operation_threshold_ms: u64,
    /// Handling of stale sibling edges after a group reset.
    pub task_group_reconciliation: TaskGroupReconciliation,
    /// Only step back once the task has succeeded at some earlier revision.
    pub stepback_requires_prior_success: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_task_execution: 3,
            slow_operation_threshold_ms: 1000,
            task_group_reconciliation: TaskGroupReconciliation::Repair,
            stepback_requires_prior_success: true,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration that only reports group inconsistencies.
    #[must_use]
    pub fn report_only() -> Self {
        Self {
            task_group_reconciliation: TaskGroupReconciliation::Report,
            ..Self::default()
        }
    }

    /// Parses a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] when a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the execution cap.
    #[must_use]
    pub const fn with_max_task_execution(mut self, max: u32) -> Self {
        self.max_task_execution = max;
        self
    }

    /// Sets the slow operation threshold.
    #[must_use]
    pub const fn with_slow_operation_threshold_ms(mut self, threshold_ms: u64) -> Self {
        self.slow_operation_threshold_ms = threshold_ms;
        self
    }

    /// Sets group reconciliation handling.
    #[must_use]
    pub const fn with_task_group_reconciliation(mut self, policy: TaskGroupReconciliation) -> Self {
        self.task_group_reconciliation = policy;
        self
    }

    /// Sets whether stepback needs an earlier success.
    #[must_use]
    pub const fn with_stepback_requires_prior_success(mut self, required: bool) -> Self {
        self.stepback_requires_prior_success = required;
        self
    }

    /// Returns the slow operation threshold.
    #[must_use]
    pub const fn slow_operation_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_operation_threshold_ms)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `max_task_execution` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_task_execution == 0 {
            return Err(ConfigError::Invalid(
                "max_task_execution must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON for [`EngineConfig`].
    #[error("failed to parse engine configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is out of range.
    #[error("invalid engine configuration: {0}")]
    Invalid(String),
}
