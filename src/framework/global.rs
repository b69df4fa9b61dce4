//! Process-wide default framework.
//!
//! The free functions here act on one lazily created [`Framework`], so a
//! test binary can register collaborators from anywhere before calling
//! [`run`]. The default framework reads its labels from `ALOE_FOCUS` and
//! `ALOE_SKIP`.

use super::{Framework, FrameworkError, SuiteReport};
use crate::cleaner::Cleaner;
use crate::config::RunnerConfig;
use crate::preset::Presetter;
use crate::template::TemplateFunction;
use crate::variables::Variable;
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

static DEFAULT: Lazy<Mutex<Option<Framework>>> = Lazy::new(|| Mutex::new(None));

fn with_default<T>(
    f: impl FnOnce(&mut Framework) -> Result<T, FrameworkError>,
) -> Result<T, FrameworkError> {
    let mut guard = DEFAULT.lock().unwrap_or_else(PoisonError::into_inner);
    let framework = match guard.take() {
        Some(framework) => framework,
        None => Framework::new(RunnerConfig::default().with_env())?,
    };
    f(guard.insert(framework))
}

/// Replaces the default framework with a fresh one built from `config`.
pub fn configure(config: RunnerConfig) -> Result<(), FrameworkError> {
    let framework = Framework::new(config)?;
    *DEFAULT.lock().unwrap_or_else(PoisonError::into_inner) = Some(framework);
    Ok(())
}

/// Drops the default framework; the next call creates a new one.
pub fn reset() {
    *DEFAULT.lock().unwrap_or_else(PoisonError::into_inner) = None;
}

pub fn env(key: impl Into<String>, value: impl Into<Variable>) -> Result<(), FrameworkError> {
    with_default(|f| f.env(key, value))
}

pub fn append_data_dirs<I, P>(dirs: I) -> Result<(), FrameworkError>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    with_default(|f| {
        f.append_data_dirs(dirs);
        Ok(())
    })
}

pub fn register_presetter(presetter: impl Presetter + 'static) -> Result<(), FrameworkError> {
    with_default(|f| f.register_presetter(presetter))
}

pub fn register_cleaner(cleaner: impl Cleaner + 'static) -> Result<(), FrameworkError> {
    with_default(|f| f.register_cleaner(cleaner))
}

pub fn register_client(name: impl Into<String>, client: reqwest::Client) -> Result<(), FrameworkError> {
    with_default(|f| f.register_client(name, client))
}

pub fn register_function(
    name: impl Into<String>,
    function: impl TemplateFunction + 'static,
) -> Result<(), FrameworkError> {
    with_default(|f| f.register_function(name, function))
}

/// Runs the default framework and returns its report.
pub fn try_run() -> Result<SuiteReport, FrameworkError> {
    with_default(|f| f.run_blocking())
}

/// Runs the default framework, panicking on a fatal error or a failed case.
pub fn run() -> SuiteReport {
    match try_run() {
        Ok(report) if report.is_success() => report,
        Ok(report) => panic!("{}", report),
        Err(e) => panic!("{}", e),
    }
}
