//! Context activation errors.

use crate::cleaner::CleanError;
use crate::preset::PresetError;
use crate::roundtrip::RoundTripError;
use crate::variables::VarError;
use thiserror::Error;

/// Errors raised while activating a context, running a case, or cleaning up.
#[derive(Debug, Error)]
pub enum ContextError {
    /// An export would shadow a variable of an enclosing context.
    #[error("can't export {name}: variable {name} has been defined in parent contexts")]
    ExportShadows { name: String },

    /// A flow defined variables an enclosing context already defines.
    #[error("context define variables which have been defined in parents: {}", .names.join(", "))]
    ParentConflict { names: Vec<String> },

    #[error("can't get presetter called {0}")]
    UnknownPresetter(String),

    #[error("can't get cleaner called {0}")]
    UnknownCleaner(String),

    #[error("presetter {name} failed: {source}")]
    Preset {
        name: String,
        #[source]
        source: PresetError,
    },

    #[error("cleaner {name} failed: {source}")]
    Clean {
        name: String,
        #[source]
        source: CleanError,
    },

    #[error("can't export var {name}: {message}")]
    Export { name: String, message: String },

    #[error(transparent)]
    RoundTrip(#[from] RoundTripError),

    #[error(transparent)]
    Variables(#[from] VarError),

    /// The shared per-context state lock was poisoned by a panicking case.
    #[error("context state of {0} is unavailable")]
    Poisoned(String),
}

impl ContextError {
    /// Returns true when a round trip ran but its response didn't match.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, ContextError::RoundTrip(e) if e.is_mismatch())
    }
}
