//! Presetters.
//!
//! A presetter rewrites the round-trip template a context hands down to its
//! round trips, children and cases. Contexts name the presetters to apply
//! and pass them rendered string arguments.

pub mod auth;
pub mod header;
pub mod host;

pub use auth::{basic_auth, bearer_token, BasicAuthPresetter, BearerAuthPresetter};
pub use header::{HeaderKind, HeaderPresetter};
pub use host::HostPresetter;

use crate::models::RoundTripTemplate;
use indexmap::IndexMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors a presetter can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresetError {
    /// A required argument was not passed.
    #[error("{0} is not defined")]
    MissingArg(String),

    #[error("invalid {arg} {value:?}: {reason}")]
    InvalidArg {
        arg: String,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Custom(String),
}

/// Rewrites a round-trip template.
///
/// # Examples
///
/// ```
/// use aloe::models::RoundTripTemplate;
/// use aloe::preset::{PresetError, Presetter};
/// use indexmap::IndexMap;
///
/// struct Tenant;
///
/// impl Presetter for Tenant {
///     fn name(&self) -> &str {
///         "tenant"
///     }
///
///     fn preset(
///         &self,
///         mut template: RoundTripTemplate,
///         args: &IndexMap<String, String>,
///     ) -> Result<RoundTripTemplate, PresetError> {
///         let id = args
///             .get("id")
///             .ok_or_else(|| PresetError::MissingArg("id".to_string()))?;
///         template.request.set_header("X-Tenant", id.clone());
///         Ok(template)
///     }
/// }
/// ```
pub trait Presetter: Send + Sync {
    /// Name contexts refer to this presetter by.
    fn name(&self) -> &str;

    fn preset(
        &self,
        template: RoundTripTemplate,
        args: &IndexMap<String, String>,
    ) -> Result<RoundTripTemplate, PresetError>;
}

/// Presetters every framework starts with.
pub fn builtin_presetters() -> Vec<Arc<dyn Presetter>> {
    vec![
        Arc::new(HeaderPresetter::new(HeaderKind::Request)),
        Arc::new(HeaderPresetter::new(HeaderKind::Response)),
        Arc::new(HostPresetter),
        Arc::new(BasicAuthPresetter),
        Arc::new(BearerAuthPresetter),
    ]
}

pub(crate) fn required<'a>(
    args: &'a IndexMap<String, String>,
    name: &str,
) -> Result<&'a str, PresetError> {
    args.get(name)
        .map(String::as_str)
        .ok_or_else(|| PresetError::MissingArg(name.to_string()))
}
