//! Runner configuration.
//!
//! Settings that apply to a whole run rather than to one data file: label
//! selection, the context file name, and timing defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the focus labels.
pub const FOCUS_ENV: &str = "ALOE_FOCUS";

/// Environment variable holding the skip labels.
pub const SKIP_ENV: &str = "ALOE_SKIP";

/// Main configuration structure for a test run.
///
/// Missing settings fall back to the defaults listed on each field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerConfig {
    /// Comma-separated labels. When non-empty, only cases carrying one of
    /// them run. Defaults to empty.
    #[serde(default)]
    pub focus: String,

    /// Comma-separated labels. Cases carrying one of them are skipped,
    /// unless focus is set. Defaults to empty.
    #[serde(default)]
    pub skip: String,

    /// Name of the per-directory context file. Defaults to `_context.yaml`.
    ///
    /// Must not be empty.
    #[serde(default = "default_context_file")]
    pub context_file: String,

    /// HTTP request timeout in milliseconds. Defaults to 30000.
    ///
    /// Must be greater than 0.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Polling timeout, in milliseconds, for eventually round trips that
    /// don't set one. Defaults to 1000.
    #[serde(default = "default_eventually_timeout")]
    pub eventually_timeout: u64,

    /// Polling interval, in milliseconds, for eventually round trips that
    /// don't set one. Defaults to 100.
    ///
    /// Must be greater than 0.
    #[serde(default = "default_eventually_interval")]
    pub eventually_interval: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            focus: String::new(),
            skip: String::new(),
            context_file: default_context_file(),
            request_timeout: default_request_timeout(),
            eventually_timeout: default_eventually_timeout(),
            eventually_interval: default_eventually_interval(),
        }
    }
}

impl RunnerConfig {
    /// Validates the configuration and returns errors if any settings are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout == 0 {
            return Err("requestTimeout must be greater than 0".to_string());
        }
        if self.eventually_interval == 0 {
            return Err("eventuallyInterval must be greater than 0".to_string());
        }
        if self.context_file.trim().is_empty() {
            return Err("contextFile must not be empty".to_string());
        }
        Ok(())
    }

    /// Merges this configuration with another, using values from `other`.
    ///
    /// Label sets are only replaced when `other` sets them.
    pub fn merge(&self, other: &RunnerConfig) -> Self {
        Self {
            focus: if other.focus.is_empty() {
                self.focus.clone()
            } else {
                other.focus.clone()
            },
            skip: if other.skip.is_empty() {
                self.skip.clone()
            } else {
                other.skip.clone()
            },
            context_file: other.context_file.clone(),
            request_timeout: other.request_timeout,
            eventually_timeout: other.eventually_timeout,
            eventually_interval: other.eventually_interval,
        }
    }

    /// Overlays the focus and skip labels from `ALOE_FOCUS` / `ALOE_SKIP`.
    pub fn with_env(mut self) -> Self {
        if let Ok(focus) = std::env::var(FOCUS_ENV) {
            self.focus = focus;
        }
        if let Ok(skip) = std::env::var(SKIP_ENV) {
            self.skip = skip;
        }
        self
    }

    pub fn request_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }

    pub fn eventually_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.eventually_timeout)
    }

    pub fn eventually_interval_duration(&self) -> Duration {
        Duration::from_millis(self.eventually_interval)
    }

    /// Returns the focus labels, trimmed, empty entries dropped.
    pub fn focus_labels(&self) -> Vec<String> {
        split_labels(&self.focus)
    }

    pub fn skip_labels(&self) -> Vec<String> {
        split_labels(&self.skip)
    }
}

fn split_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

// Default value functions for serde

fn default_context_file() -> String {
    "_context.yaml".to_string()
}

fn default_request_timeout() -> u64 {
    30000 // 30 seconds in milliseconds
}

fn default_eventually_timeout() -> u64 {
    1000
}

fn default_eventually_interval() -> u64 {
    100
}
