//! Aloe command-line runner.
//!
//! Runs test-data directories against a live service and exits non-zero
//! when any case fails.
//!
//! # Usage
//!
//! ```bash
//! aloe --env host=localhost:8080 testdata/
//! aloe --focus smoke --env host=localhost:8080 testdata/users testdata/orders
//! aloe --config aloe.yaml --env host=localhost:8080 testdata/
//! ```
//!
//! Flags override the settings file, which overrides the defaults.

use aloe::config::{load_config, load_config_file, RunnerConfig};
use aloe::Framework;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// Aloe - declarative HTTP API tests
#[derive(Parser)]
#[command(name = "aloe")]
#[command(version)]
struct Cli {
    /// Settings file (YAML or JSON) with an `aloe` section
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only run cases carrying one of these comma-separated labels
    #[arg(long, env = "ALOE_FOCUS")]
    focus: Option<String>,

    /// Skip cases carrying one of these comma-separated labels
    #[arg(long, env = "ALOE_SKIP")]
    skip: Option<String>,

    /// Top-level variable, as KEY=VALUE. May be repeated.
    #[arg(short, long = "env", value_parser = parse_key_value)]
    env: Vec<(String, String)>,

    /// Name of the per-directory context file [default: _context.yaml]
    #[arg(long)]
    context_file: Option<String>,

    /// HTTP request timeout in milliseconds [default: 30000]
    #[arg(long)]
    request_timeout: Option<u64>,

    /// Data directories to run
    #[arg(required = true)]
    dirs: Vec<PathBuf>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("{:?} should be KEY=VALUE", raw)),
    }
}

impl Cli {
    fn runner_config(&self) -> Result<RunnerConfig, String> {
        let mut config = match &self.config {
            Some(path) => load_config_file(path)?,
            None => load_config(None)?,
        };
        if let Some(focus) = &self.focus {
            config.focus = focus.clone();
        }
        if let Some(skip) = &self.skip {
            config.skip = skip.clone();
        }
        if let Some(context_file) = &self.context_file {
            config.context_file = context_file.clone();
        }
        if let Some(timeout) = self.request_timeout {
            config.request_timeout = timeout;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    aloe::init_logging();
    let cli = Cli::parse();

    let config = match cli.runner_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    let mut framework = match Framework::new(config) {
        Ok(framework) => framework,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };
    for (key, value) in cli.env {
        if let Err(e) = framework.env(key, value) {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    }
    framework.append_data_dirs(cli.dirs);

    match framework.run_blocking() {
        Ok(report) => {
            println!("{}", report);
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::NamedTempFile;

    #[test]
    fn test_flags_override_settings_file() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "aloe:\n  skip: slow\n  requestTimeout: 5000\n").unwrap();
        let path = file.path().to_str().unwrap();

        let cli = Cli::parse_from(["aloe", "--config", path, "--request-timeout", "900", "data"]);
        let config = cli.runner_config().unwrap();
        assert_eq!(config.skip_labels(), vec!["slow"]);
        assert_eq!(config.request_timeout, 900);
        assert_eq!(config.context_file, "_context.yaml");
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("host=localhost:8080"),
            Ok(("host".to_string(), "localhost:8080".to_string()))
        );
        assert!(parse_key_value("=x").is_err());
    }
}
