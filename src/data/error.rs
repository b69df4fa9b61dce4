//! Test-data loading errors.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a test-data tree.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("can't read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Every data directory needs its own context file.
    #[error("read context config {} error: {file} is missing", dir.display())]
    MissingContext { dir: PathBuf, file: String },

    #[error("can't unmarshal {}, err: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid {}:\n{errors}", path.display())]
    Invalid { path: PathBuf, errors: ErrorList },
}

/// Validation errors, rendered one per line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList(pub Vec<String>);

impl ErrorList {
    pub fn push(&mut self, error: impl Into<String>) {
        self.0.push(error.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("\n"))
    }
}
