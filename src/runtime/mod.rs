//! Context propagation.
//!
//! Each test-data directory becomes a [`ContextNode`]. Before every case the
//! nodes on the path from the root to the case are activated in order, each
//! building on the [`ActiveContext`] its parent handed down; after the case
//! they are finished in reverse order so cleaners can run.

pub mod context;
pub mod error;
pub mod scope;
pub mod selection;

pub use context::{run_case, ActiveContext, ContextNode};
pub use error::ContextError;
pub use scope::ScopeChain;
pub use selection::LabelFilter;

use crate::cleaner::Cleaner;
use crate::preset::Presetter;
use crate::roundtrip::RoundTripRunner;
use crate::template::FunctionRegistry;
use indexmap::IndexMap;
use std::sync::Arc;

/// Presetters by name.
pub type PresetterTable = IndexMap<String, Arc<dyn Presetter>>;

/// Cleaners by name.
pub type CleanerTable = IndexMap<String, Arc<dyn Cleaner>>;

/// Everything context activation needs from the framework, borrowed for the
/// length of a run.
#[derive(Clone, Copy)]
pub struct Runtime<'a> {
    pub runner: RoundTripRunner<'a>,
    pub functions: &'a FunctionRegistry,
    pub presetters: &'a PresetterTable,
    pub cleaners: &'a CleanerTable,
}
