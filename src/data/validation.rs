//! Checks run on loaded configs before anything executes.

use super::error::ErrorList;
use crate::config::{CaseConfig, ContextConfig};
use std::collections::HashSet;

/// Validates a context config, collecting every problem.
pub fn validate_context(context: &ContextConfig) -> Result<(), ErrorList> {
    let mut errors = ErrorList::default();

    for (i, flow) in context.validated_flow.iter().enumerate() {
        if flow.constructor.is_empty() || flow.validator.is_empty() {
            errors.push(format!(
                "validatedFlow[{}]: constructor and validator should not be empty",
                i
            ));
        }
    }

    for (i, presetter) in context.presetters.iter().enumerate() {
        if presetter.name.is_empty() {
            errors.push(format!("presetters[{}]: name should not be empty", i));
        }
    }

    for (i, cleaner) in context.cleaners.iter().enumerate() {
        if cleaner.name.is_empty() {
            errors.push(format!("cleaners[{}]: name should not be empty", i));
        }
    }

    let mut exported = HashSet::new();
    for (i, export) in context.exports.iter().enumerate() {
        if export.name.is_empty() {
            errors.push(format!("exports[{}]: name should not be empty", i));
        } else if !exported.insert(export.name.as_str()) {
            errors.push(format!("can't export var {} twice", export.name));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a case config.
pub fn validate_case(case: &CaseConfig) -> Result<(), ErrorList> {
    let mut errors = ErrorList::default();
    for (i, rt) in case.flow.iter().enumerate() {
        for (j, def) in rt.definitions.iter().enumerate() {
            if def.name.is_empty() {
                errors.push(format!("flow[{}].definitions[{}]: name should not be empty", i, j));
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
