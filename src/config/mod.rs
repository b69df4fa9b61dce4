//! Configuration.
//!
//! [`RunnerConfig`] holds run-wide settings; [`schema`] describes the YAML
//! test-data files.

pub mod runner;
pub mod schema;

pub use runner::{RunnerConfig, FOCUS_ENV, SKIP_ENV};
pub use schema::{
    CaseConfig, CleanerConfig, ContextConfig, DefinitionConfig, DefinitionType, EventuallyConfig,
    ExportConfig, PresetConfig, RequestConfig, ResponseConfig, RoundTripConfig,
    ValidatedFlowConfig, WhenConfig,
};

use serde_json::Value;
use std::fs;
use std::path::Path;

/// Loads a runner configuration from a JSON value.
///
/// Settings are read from the `"aloe"` key and merged over the defaults.
/// Unparseable settings are logged and ignored.
///
/// # Arguments
///
/// * `settings_json` - Optional JSON value containing settings under the `"aloe"` key
///
/// # Returns
///
/// `Ok(RunnerConfig)` with the loaded configuration, or `Err` if validation fails.
///
/// # Example
///
/// ```
/// use aloe::config::load_config;
/// use serde_json::json;
///
/// let settings = json!({
///     "aloe": {
///         "focus": "smoke",
///         "requestTimeout": 5000
///     }
/// });
///
/// let config = load_config(Some(settings)).unwrap();
/// assert_eq!(config.request_timeout, 5000);
/// assert_eq!(config.focus_labels(), vec!["smoke"]);
/// ```
pub fn load_config(settings_json: Option<Value>) -> Result<RunnerConfig, String> {
    let mut config = RunnerConfig::default();

    if let Some(settings) = settings_json.as_ref().and_then(|s| s.get("aloe")) {
        match serde_json::from_value::<RunnerConfig>(settings.clone()) {
            Ok(user_config) => config = config.merge(&user_config),
            Err(e) => log::warn!("failed to parse aloe settings: {}, using defaults", e),
        }
    }

    config
        .validate()
        .map_err(|e| format!("invalid configuration: {}", e))?;
    Ok(config)
}

/// Loads a runner configuration from a YAML or JSON settings file.
///
/// The file holds the same `"aloe"` section [`load_config`] reads.
pub fn load_config_file(path: &Path) -> Result<RunnerConfig, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("can't read {}: {}", path.display(), e))?;
    let settings: Value = serde_yaml::from_str(&content)
        .map_err(|e| format!("can't parse {}: {}", path.display(), e))?;
    load_config(Some(settings))
}
