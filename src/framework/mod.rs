//! Registration API and suite runner.
//!
//! A [`Framework`] collects environment variables, data directories and
//! collaborators, then runs every case found under the data directories
//! against the service under test.
//!
//! # Example
//!
//! ```no_run
//! use aloe::config::RunnerConfig;
//! use aloe::framework::Framework;
//!
//! let mut framework = Framework::new(RunnerConfig::default().with_env()).unwrap();
//! framework.env("host", "localhost:8080").unwrap();
//! framework.append_data_dirs(["testdata"]);
//! framework.run_and_report();
//! ```

pub mod error;
pub mod global;
mod plan;
pub mod report;

pub use error::FrameworkError;
pub use report::{CaseReport, Outcome, SuiteReport};

use crate::cleaner::Cleaner;
use crate::config::RunnerConfig;
use crate::data;
use crate::executor::{ClientRegistry, ExecutionConfig, HttpClient};
use crate::preset::{builtin_presetters, Presetter};
use crate::roundtrip::RoundTripRunner;
use crate::runtime::{ActiveContext, CleanerTable, LabelFilter, PresetterTable, Runtime};
use crate::template::{FunctionRegistry, TemplateFunction};
use crate::variables::{Variable, VariableMap};
use plan::Plan;
use std::path::PathBuf;
use std::sync::Arc;

/// A configured test suite.
pub struct Framework {
    config: RunnerConfig,
    env: VariableMap,
    data_dirs: Vec<PathBuf>,
    presetters: PresetterTable,
    cleaners: CleanerTable,
    clients: ClientRegistry,
    functions: FunctionRegistry,
}

impl Framework {
    /// Creates a framework with the built-in presetters and template
    /// functions, and a default HTTP client built from `config`.
    pub fn new(config: RunnerConfig) -> Result<Self, FrameworkError> {
        config.validate().map_err(FrameworkError::Config)?;
        let client = HttpClient::new(&ExecutionConfig::from_runner(&config))?;
        let presetters = builtin_presetters()
            .into_iter()
            .map(|p| (p.name().to_string(), p))
            .collect();

        Ok(Self {
            config,
            env: VariableMap::new(),
            data_dirs: Vec::new(),
            presetters,
            cleaners: CleanerTable::new(),
            clients: ClientRegistry::new(client),
            functions: FunctionRegistry::with_builtins(),
        })
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Seeds a variable visible to every context and case.
    pub fn env(&mut self, key: impl Into<String>, value: impl Into<Variable>) -> Result<(), FrameworkError> {
        let key = key.into();
        if self.env.contains(&key) {
            return Err(FrameworkError::EnvDefined(key));
        }
        self.env.set(key, value);
        Ok(())
    }

    pub fn append_data_dirs<I, P>(&mut self, dirs: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.data_dirs.extend(dirs.into_iter().map(Into::into));
    }

    pub fn register_presetter(&mut self, presetter: impl Presetter + 'static) -> Result<(), FrameworkError> {
        let name = presetter.name().to_string();
        if self.presetters.contains_key(&name) {
            return Err(FrameworkError::Duplicate {
                kind: "presetter",
                name,
            });
        }
        self.presetters.insert(name, Arc::new(presetter));
        Ok(())
    }

    pub fn register_cleaner(&mut self, cleaner: impl Cleaner + 'static) -> Result<(), FrameworkError> {
        let name = cleaner.name().to_string();
        if self.cleaners.contains_key(&name) {
            return Err(FrameworkError::Duplicate {
                kind: "cleaner",
                name,
            });
        }
        self.cleaners.insert(name, Arc::new(cleaner));
        Ok(())
    }

    /// Registers an HTTP client round trips can pick with `client: <name>`.
    pub fn register_client(
        &mut self,
        name: impl Into<String>,
        client: reqwest::Client,
    ) -> Result<(), FrameworkError> {
        let name = name.into();
        if !self
            .clients
            .register(name.clone(), HttpClient::from_client(client))
        {
            return Err(FrameworkError::Duplicate { kind: "client", name });
        }
        Ok(())
    }

    /// Registers a template function callable as `%{name(...)}`.
    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        function: impl TemplateFunction + 'static,
    ) -> Result<(), FrameworkError> {
        Ok(self.functions.register(name, function)?)
    }

    /// Loads every data directory, then runs all cases.
    ///
    /// A directory that can't be loaded, or a context naming an unknown
    /// presetter or cleaner, aborts the run before any case executes. Case failures are recorded in the report.
    pub async fn run(&self) -> Result<SuiteReport, FrameworkError> {
        let dirs = self
            .data_dirs
            .iter()
            .map(|dir| data::walk(dir, &self.config.context_file))
            .collect::<Result<Vec<_>, _>>()?;
        let plan = Plan::build(&dirs, &LabelFilter::from_config(&self.config));
        plan.check_collaborators(&self.presetters, &self.cleaners)?;
        log::info!("running {} cases from {} data dirs", plan.len(), dirs.len());

        let rt = Runtime {
            runner: RoundTripRunner::new(&self.clients, &self.functions, &self.config),
            functions: &self.functions,
            presetters: &self.presetters,
            cleaners: &self.cleaners,
        };
        let root = ActiveContext::root(self.env.clone());
        let report = SuiteReport {
            cases: plan.execute(&root, &rt).await,
        };
        log::info!("{}", report.summary());
        Ok(report)
    }

    /// Runs the suite on a fresh tokio runtime.
    pub fn run_blocking(&self) -> Result<SuiteReport, FrameworkError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run())
    }

    /// Runs the suite and panics if it can't run or any case fails, so a
    /// hosting `#[test]` fails with the rendered report.
    pub fn run_and_report(&self) -> SuiteReport {
        match self.run_blocking() {
            Ok(report) if report.is_success() => report,
            Ok(report) => panic!("{}", report),
            Err(e) => panic!("{}", e),
        }
    }
}
