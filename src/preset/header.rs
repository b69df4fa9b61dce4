//! `requestHeader` and `responseHeader` presetters.

use super::{PresetError, Presetter};
use crate::models::RoundTripTemplate;
use indexmap::IndexMap;

/// Which side of the round trip a [`HeaderPresetter`] writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Request,
    Response,
}

/// Copies every argument into the template as a header.
///
/// Request headers are sent; response headers are expected.
#[derive(Debug, Clone, Copy)]
pub struct HeaderPresetter {
    kind: HeaderKind,
}

impl HeaderPresetter {
    pub fn new(kind: HeaderKind) -> Self {
        Self { kind }
    }
}

impl Presetter for HeaderPresetter {
    fn name(&self) -> &str {
        match self.kind {
            HeaderKind::Request => "requestHeader",
            HeaderKind::Response => "responseHeader",
        }
    }

    fn preset(
        &self,
        mut template: RoundTripTemplate,
        args: &IndexMap<String, String>,
    ) -> Result<RoundTripTemplate, PresetError> {
        for (name, value) in args {
            match self.kind {
                HeaderKind::Request => template.request.set_header(name, value.clone()),
                HeaderKind::Response => template.response.set_header(name, value.clone()),
            }
        }
        Ok(template)
    }
}
