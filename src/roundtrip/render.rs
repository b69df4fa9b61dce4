//! Rendering of round-trip configs into concrete round trips.
//!
//! A rendered round trip starts as a copy of the context's template and
//! takes every field its config sets, with all templates resolved against
//! the current scope.

use super::error::RoundTripError;
use crate::config::{DefinitionConfig, EventuallyConfig, RoundTripConfig, WhenConfig};
use crate::models::{Definition, Eventually, HttpMethod, RoundTrip, RoundTripTemplate};
use crate::template::{FunctionRegistry, Template};
use crate::variables::VariableMap;
use indexmap::IndexMap;

/// A rendered `when` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct When {
    pub expr: String,
    pub args: IndexMap<String, String>,
}

/// Renders templates against one scope.
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'a> {
    vars: &'a VariableMap,
    functions: &'a FunctionRegistry,
}

impl<'a> Renderer<'a> {
    pub fn new(vars: &'a VariableMap, functions: &'a FunctionRegistry) -> Self {
        Self { vars, functions }
    }

    pub fn render(&self, field: &str, template: &Template) -> Result<String, RoundTripError> {
        template
            .render_with(self.vars, self.functions)
            .map_err(|e| RoundTripError::render(field, e))
    }

    /// Renders a named argument map, keeping its order.
    pub fn render_args(
        &self,
        field: &str,
        args: &IndexMap<String, Template>,
    ) -> Result<IndexMap<String, String>, RoundTripError> {
        args.iter()
            .map(|(key, value)| {
                let rendered = self.render(&format!("{}.{}", field, key), value)?;
                Ok((key.clone(), rendered))
            })
            .collect()
    }

    pub fn render_selector(
        &self,
        field: &str,
        selector: &[Template],
    ) -> Result<Vec<String>, RoundTripError> {
        selector
            .iter()
            .map(|segment| self.render(field, segment))
            .collect()
    }

    pub fn render_when(&self, when: &WhenConfig) -> Result<When, RoundTripError> {
        Ok(When {
            expr: when.expr.clone(),
            args: self.render_args("when.args", &when.args)?,
        })
    }

    /// Renders `config` on top of `template`.
    ///
    /// Only the fields `config` sets end up in the overlay; everything else
    /// is inherited when the overlay is patched onto the template.
    pub fn render_round_trip(
        &self,
        config: &RoundTripConfig,
        template: &RoundTripTemplate,
    ) -> Result<RoundTrip, RoundTripError> {
        let mut overlay = RoundTrip {
            description: config.description.clone(),
            client: config.client.clone().filter(|c| !c.is_empty()),
            ..RoundTrip::default()
        };

        let request = &config.request;
        if let Some(host) = &request.host {
            overlay.request.host = Some(self.render("request.host", host)?);
        }
        if let Some(scheme) = &request.scheme {
            overlay.request.scheme = Some(self.render("request.scheme", scheme)?);
        }
        if let Some(api) = &request.api {
            let api = self.render("request.api", api)?;
            let (method, path) = split_method_and_path(&api)?;
            overlay.request.method = Some(method);
            overlay.request.path = Some(match (strip_backticks(path), &template.request.path_template) {
                (Some(verbatim), _) => verbatim.to_string(),
                (None, Some(wrapper)) => wrapper.replacen("%s", path, 1),
                (None, None) => path.to_string(),
            });
        }
        for (name, value) in &request.headers {
            let rendered = self.render(&format!("request.headers.{}", name), value)?;
            overlay.request.set_header(name, rendered);
        }
        if let Some(body) = &request.body {
            overlay.request.body = Some(self.render("request.body", body)?);
        }

        let response = &config.response;
        overlay.response.status_code = response.status_code;
        for (name, value) in &response.headers {
            let rendered = self.render(&format!("response.headers.{}", name), value)?;
            overlay.response.set_header(name, rendered);
        }
        if let Some(body) = &response.body {
            overlay.response.body = Some(self.render("response.body", body)?);
        }
        overlay.response.eventually = response.eventually.as_ref().map(render_eventually);

        overlay.definitions = config
            .definitions
            .iter()
            .map(|d| self.render_definition(d))
            .collect::<Result<_, _>>()?;
        Ok(template.patched(overlay))
    }

    fn render_definition(&self, config: &DefinitionConfig) -> Result<Definition, RoundTripError> {
        let field = format!("definition {}", config.name);
        Ok(Definition {
            name: config.name.clone(),
            kind: config.kind,
            selector: self.render_selector(&field, &config.selector)?,
        })
    }
}

fn render_eventually(config: &EventuallyConfig) -> Eventually {
    Eventually {
        timeout: config.timeout,
        interval: config.interval,
    }
}

/// Splits `METHOD /path` on the first space.
fn split_method_and_path(api: &str) -> Result<(HttpMethod, &str), RoundTripError> {
    let (method, path) = api
        .trim()
        .split_once(' ')
        .ok_or_else(|| RoundTripError::Invalid(format!("api {:?} should be \"METHOD PATH\"", api)))?;
    let method = method.trim().parse().map_err(RoundTripError::Invalid)?;
    Ok((method, path.trim()))
}

fn strip_backticks(path: &str) -> Option<&str> {
    if path.len() < 2 {
        return None;
    }
    path.strip_prefix('`').and_then(|p| p.strip_suffix('`'))
}
