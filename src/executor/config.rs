//! HTTP request execution configuration.

use crate::config::RunnerConfig;
use std::time::Duration;

/// Parameters that control how requests are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Maximum time to wait for a complete response, including the body.
    pub timeout: Duration,
}

impl ExecutionConfig {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Creates an ExecutionConfig from the runner settings.
    pub fn from_runner(config: &RunnerConfig) -> Self {
        Self::new(config.request_timeout_duration())
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self::from_runner(&RunnerConfig::default())
    }
}
