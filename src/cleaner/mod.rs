//! Cleaners.
//!
//! A cleaner tears down what a context created: deleting objects, dropping
//! a database, and so on. Contexts list the cleaners to call and whether to
//! call them after every case in their subtree or only after the last one.

use crate::models::RoundTripTemplate;
use async_trait::async_trait;
use indexmap::IndexMap;
use thiserror::Error;

/// Error reported by a cleaner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct CleanError(pub String);

impl CleanError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A teardown hook.
///
/// The template is the owning context's round-trip template, so a cleaner
/// can reach the system under test with the same host and headers the
/// context's round trips used.
#[async_trait]
pub trait Cleaner: Send + Sync {
    /// Name contexts refer to this cleaner by.
    fn name(&self) -> &str;

    async fn clean(
        &self,
        template: &RoundTripTemplate,
        args: &IndexMap<String, String>,
    ) -> Result<(), CleanError>;
}

/// A context's cleaner with its arguments rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanerCall {
    pub name: String,
    pub for_each: bool,
    pub args: IndexMap<String, String>,
}
