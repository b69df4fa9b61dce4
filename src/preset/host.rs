//! `host` presetter.

use super::{required, PresetError, Presetter};
use crate::models::RoundTripTemplate;
use indexmap::IndexMap;

/// Sets the target of every request.
///
/// Arguments:
///
/// * `host` - required, `name[:port]`
/// * `scheme` - optional, defaults to `http`
/// * `pathTemplate` - optional wrapper for relative paths, with exactly one `%s`
#[derive(Debug, Clone, Copy, Default)]
pub struct HostPresetter;

impl Presetter for HostPresetter {
    fn name(&self) -> &str {
        "host"
    }

    fn preset(
        &self,
        mut template: RoundTripTemplate,
        args: &IndexMap<String, String>,
    ) -> Result<RoundTripTemplate, PresetError> {
        let host = required(args, "host")?;
        let scheme = args.get("scheme").map(String::as_str).unwrap_or("http");

        template.request.host = Some(host.to_string());
        template.request.scheme = Some(scheme.to_string());

        if let Some(path_template) = args.get("pathTemplate") {
            if path_template.matches("%s").count() != 1 {
                return Err(PresetError::InvalidArg {
                    arg: "pathTemplate".to_string(),
                    value: path_template.clone(),
                    reason: "should contain exactly one %s".to_string(),
                });
            }
            template.request.path_template = Some(path_template.clone());
        }
        Ok(template)
    }
}
