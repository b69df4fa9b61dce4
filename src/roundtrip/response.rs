//! Response checking and variable extraction.

use super::error::RoundTripError;
use crate::config::DefinitionType;
use crate::matcher::{MatchFailure, Matcher};
use crate::models::{Definition, HttpResponse, RoundTrip};
use crate::variables::{Variable, VariableMap};
use indexmap::IndexMap;
use serde_json::Value;

#[derive(Debug, Clone)]
enum BodyExpectation {
    Unchecked,
    Empty,
    Pattern(Matcher),
}

/// Checks a response against a round trip's expectations, then binds its
/// definitions.
///
/// Every expectation is checked and every failure collected. Definitions are
/// only extracted from a response that matched.
#[derive(Debug, Clone)]
pub struct ResponseMatcher {
    status_code: Option<u16>,
    headers: IndexMap<String, String>,
    body: BodyExpectation,
    definitions: Vec<Definition>,
}

impl ResponseMatcher {
    /// Compiles the expectations of `rt`. An invalid body pattern is an error.
    pub fn new(rt: &RoundTrip) -> Result<Self, RoundTripError> {
        let body = match rt.response.body.as_deref() {
            None => BodyExpectation::Unchecked,
            Some("") => BodyExpectation::Empty,
            Some(pattern) => BodyExpectation::Pattern(Matcher::parse(pattern)?),
        };
        Ok(Self {
            status_code: rt.response.status_code,
            headers: rt.response.headers.clone(),
            body,
            definitions: rt.definitions.clone(),
        })
    }

    /// Checks `response` and returns the variables it defines.
    pub fn check(&self, response: &HttpResponse) -> Result<VariableMap, Vec<MatchFailure>> {
        let mut failures = Vec::new();
        let text = response.body_text();

        if let Some(expected) = self.status_code {
            if response.status_code != expected {
                failures.push(MatchFailure::new(format!(
                    "status code is not matched, expected: {}, actual: {}",
                    expected, response.status_code
                )));
                failures.push(MatchFailure::new(format!("api status: {}", text)));
            }
        }

        for (name, expected) in &self.headers {
            let actual = response.header(name).unwrap_or_default();
            if actual != expected {
                failures.push(MatchFailure::new(format!(
                    "response header {} is not matched, expected: {}, actual: {}",
                    name, expected, actual
                )));
            }
        }

        let mut parsed: Option<Value> = None;
        match &self.body {
            BodyExpectation::Unchecked => {}
            BodyExpectation::Empty => {
                if !response.body.is_empty() {
                    failures.push(MatchFailure::new(format!(
                        "body should be empty, actual: {}",
                        text
                    )));
                }
            }
            BodyExpectation::Pattern(matcher) => match response.json() {
                Ok(value) => {
                    if let Err(body_failures) = matcher.matches(&value) {
                        failures.push(MatchFailure::nested(
                            "can't match response body:",
                            body_failures,
                        ));
                    }
                    parsed = Some(value);
                }
                Err(_) => {
                    failures.push(MatchFailure::new(format!(
                        "can't unmarshal body({}) to json, only json Content-Type is supported",
                        text
                    )));
                    return Err(failures);
                }
            },
        }

        if !failures.is_empty() {
            return Err(failures);
        }

        let mut vars = VariableMap::new();
        for def in &self.definitions {
            match extract(def, response, &mut parsed) {
                Ok(value) => vars.set(def.name.clone(), value),
                Err(failure) => failures.push(failure),
            }
        }

        if failures.is_empty() {
            Ok(vars)
        } else {
            Err(failures)
        }
    }
}

fn extract(
    def: &Definition,
    response: &HttpResponse,
    parsed: &mut Option<Value>,
) -> Result<Variable, MatchFailure> {
    match def.kind {
        DefinitionType::Status => Ok(Variable::from(response.status_code)),
        DefinitionType::Header => {
            let [name] = def.selector.as_slice() else {
                return Err(MatchFailure::new(format!(
                    "header definition {} expected selector with len 1, actual is {:?}",
                    def.name, def.selector
                )));
            };
            response
                .header(name)
                .map(Variable::from)
                .ok_or_else(|| {
                    MatchFailure::new(format!(
                        "can't define variable {}: header {} is not found",
                        def.name, name
                    ))
                })
        }
        DefinitionType::Body => {
            if parsed.is_none() {
                let value = response.json().map_err(|e| {
                    MatchFailure::new(format!(
                        "can't define variable {}: body is not json: {}",
                        def.name, e
                    ))
                })?;
                *parsed = Some(value);
            }
            let body = Variable::from_json(parsed.clone().unwrap_or_default());
            body.select(&def.selector).map_err(|e| {
                MatchFailure::new(format!(
                    "can't define variable {} from {:?}: {}",
                    def.name, def.selector, e
                ))
            })
        }
    }
}
