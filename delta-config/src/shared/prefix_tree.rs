use serde::{Deserialize, Serialize};

use crate::shared::{LogLevel, ValidationError};

/// Settings for the prefix tree builder.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PrefixTreeConfig {
    /// Number of concurrent workers expanding nodes.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Minimum log level used when initializing tracing.
    #[serde(default)]
    pub min_log_level: LogLevel,
}

impl PrefixTreeConfig {
    /// Default number of workers expanding nodes concurrently.
    pub const DEFAULT_WORKER_COUNT: usize = 16;

    /// Creates a configuration with `worker_count` workers and the default log level.
    pub fn with_worker_count(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Self::default()
        }
    }

    /// Ensures the worker count is non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.worker_count == 0 {
            return Err(ValidationError::WorkerCountZero(self.worker_count));
        }

        Ok(())
    }
}

impl Default for PrefixTreeConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            min_log_level: LogLevel::default(),
        }
    }
}

fn default_worker_count() -> usize {
    PrefixTreeConfig::DEFAULT_WORKER_COUNT
}
