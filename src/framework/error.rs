//! Fatal framework errors.

use crate::data::LoadError;
use crate::executor::RequestError;
use crate::runtime::ContextError;
use crate::template::TemplateError;
use thiserror::Error;

/// Errors that stop a run before any case executes, or reject a
/// registration.
#[derive(Debug, Error)]
pub enum FrameworkError {
    /// An environment variable was seeded twice.
    #[error("{0} has been defined")]
    EnvDefined(String),

    #[error("can't register {kind} {name}: already exists")]
    Duplicate { kind: &'static str, name: String },

    #[error("invalid runner config: {0}")]
    Config(String),

    #[error(transparent)]
    Client(#[from] RequestError),

    #[error(transparent)]
    Function(#[from] TemplateError),

    #[error(transparent)]
    Load(#[from] LoadError),

    /// A context names a presetter or cleaner that isn't registered.
    #[error("context {context}: {source}")]
    Collaborator {
        context: String,
        source: ContextError,
    },

    #[error("can't start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
