//! Test-data tree loading.
//!
//! A data directory holds a context file and any number of `.yaml` case
//! files; each subdirectory is a nested context with the same layout.
//! Entries are visited in name order so runs are reproducible.

pub mod error;
pub mod validation;

pub use error::{ErrorList, LoadError};
pub use validation::{validate_case, validate_context};

use crate::config::{CaseConfig, ContextConfig};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// A loaded data directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Dir {
    pub name: String,
    pub path: PathBuf,
    pub context: ContextConfig,
    /// Number of cases in this directory and all of its subdirectories.
    pub case_num: usize,
    pub dirs: Vec<Dir>,
    pub files: Vec<CaseFile>,
}

/// A loaded case file.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseFile {
    pub name: String,
    pub path: PathBuf,
    pub case: CaseConfig,
}

impl Dir {
    /// Label shown for this directory in reports: `name: summary`.
    pub fn summary(&self) -> String {
        summary(&self.name, &self.context.summary)
    }
}

impl CaseFile {
    pub fn summary(&self) -> String {
        summary(&self.name, &self.case.summary)
    }
}

fn summary(name: &str, summary: &str) -> String {
    if summary.is_empty() {
        name.to_string()
    } else {
        format!("{}: {}", name, summary)
    }
}

/// Loads the data tree rooted at `path`.
///
/// # Arguments
///
/// * `path` - Root data directory
/// * `context_file` - Name of the context file every directory must contain
///
/// # Returns
///
/// The loaded tree, or the first error met while reading it.
pub fn walk(path: impl AsRef<Path>, context_file: &str) -> Result<Dir, LoadError> {
    let path = path.as_ref();
    let io_error = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(path)
        .map_err(io_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_error)?;
    entries.sort_by_key(|e| e.file_name());

    let context = read_context(path, context_file)?;
    let mut dir = Dir {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        path: path.to_path_buf(),
        context,
        case_num: 0,
        dirs: Vec::new(),
        files: Vec::new(),
    };

    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let child_path = entry.path();
        if child_path.is_dir() {
            let child = walk(&child_path, context_file)?;
            dir.case_num += child.case_num;
            dir.dirs.push(child);
        } else if is_case_file(&name, context_file) {
            let case: CaseConfig = read_yaml(&child_path)?;
            validate_case(&case).map_err(|errors| LoadError::Invalid {
                path: child_path.clone(),
                errors,
            })?;
            dir.files.push(CaseFile {
                name,
                path: child_path,
                case,
            });
            dir.case_num += 1;
        }
    }

    log::debug!("loaded {} with {} cases", path.display(), dir.case_num);
    Ok(dir)
}

fn read_context(dir: &Path, context_file: &str) -> Result<ContextConfig, LoadError> {
    let path = dir.join(context_file);
    if !path.is_file() {
        return Err(LoadError::MissingContext {
            dir: dir.to_path_buf(),
            file: context_file.to_string(),
        });
    }
    let context: ContextConfig = read_yaml(&path)?;
    validate_context(&context).map_err(|errors| LoadError::Invalid { path, errors })?;
    Ok(context)
}

fn read_yaml<T: DeserializeOwned + Default>(path: &Path) -> Result<T, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(&content).map_err(|source| LoadError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

fn is_case_file(name: &str, context_file: &str) -> bool {
    name != context_file && Path::new(name).extension().is_some_and(|ext| ext == "yaml")
}
