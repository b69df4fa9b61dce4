//! Aloe: declarative, data-driven black-box HTTP API testing.
//!
//! Tests are YAML files arranged in directories. Each directory carries a
//! context file that prepares what its cases need (variables, default
//! headers, setup requests, cleanup), and every other `.yaml` file is a case:
//! a sequence of round trips, each one a templated request plus the response
//! it expects.
//!
//! # Architecture
//!
//! - **variables**: typed variable values, ordered maps and merge policies
//! - **template**: `%{...}` template parsing and rendering with pluggable functions
//! - **matcher**: structural JSON matching with `$exists`, `$regexp`, `$match` and `$len`
//! - **models**: literal requests, responses and round trips
//! - **executor**: HTTP transport over reqwest
//! - **roundtrip**: rendering, sending and checking round trips
//! - **runtime**: context activation, scope chains and cleanup
//! - **data**: loading test-data directories
//! - **config**: runner settings and the YAML schema
//! - **preset** / **cleaner**: pluggable collaborators
//! - **framework**: registration API and suite runner
//!
//! # Usage
//!
//! ```no_run
//! #[test]
//! fn api() {
//!     aloe::init_logging();
//!     aloe::env("host", "localhost:8080").unwrap();
//!     aloe::append_data_dirs(["testdata"]).unwrap();
//!     aloe::run();
//! }
//! ```

use std::sync::Once;

pub mod cleaner;
pub mod config;
pub mod data;
pub mod executor;
pub mod framework;
pub mod matcher;
pub mod models;
pub mod preset;
pub mod roundtrip;
pub mod runtime;
pub mod template;
pub mod variables;

pub use cleaner::{CleanError, Cleaner};
pub use config::RunnerConfig;
pub use framework::global::{
    append_data_dirs, env, register_cleaner, register_client, register_function, register_presetter,
    run,
};
pub use framework::{Framework, FrameworkError, Outcome, SuiteReport};
pub use matcher::Matcher;
pub use models::RoundTripTemplate;
pub use preset::{PresetError, Presetter};
pub use template::Template;
pub use variables::{Variable, VariableMap};

static LOGGING: Once = Once::new();

/// Initialises `env_logger` once. Output is controlled by `RUST_LOG` and is
/// captured by the test harness.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let _ = env_logger::Builder::from_default_env().is_test(true).try_init();
    });
}
