//! Round-trip execution.
//!
//! A round trip is rendered from its config against the current scope,
//! sent, and checked. Eventually round trips poll until they match or time
//! out; looped round trips run once per iteration with an `iterator`
//! variable and combine what each iteration defines into arrays.

pub mod condition;
pub mod error;
pub mod render;
pub mod response;

pub use condition::evaluate;
pub use error::{Mismatch, RoundTripError};
pub use render::{Renderer, When};
pub use response::ResponseMatcher;

use crate::config::{RoundTripConfig, RunnerConfig};
use crate::executor::{ClientRegistry, HttpClient};
use crate::matcher::MatchFailure;
use crate::models::{HttpRequest, RoundTrip, RoundTripTemplate};
use crate::template::FunctionRegistry;
use crate::variables::{MergePolicy, Variable, VariableMap};
use std::time::{Duration, Instant};

/// Name of the loop iteration variable. Its value is `[i]`, ready to be used
/// as a selector segment.
pub const ITERATOR: &str = "iterator";

/// Runs round trips with a shared set of clients and template functions.
#[derive(Debug, Clone, Copy)]
pub struct RoundTripRunner<'a> {
    clients: &'a ClientRegistry,
    functions: &'a FunctionRegistry,
    default_timeout: Duration,
    default_interval: Duration,
}

impl<'a> RoundTripRunner<'a> {
    pub fn new(
        clients: &'a ClientRegistry,
        functions: &'a FunctionRegistry,
        config: &RunnerConfig,
    ) -> Self {
        Self {
            clients,
            functions,
            default_timeout: config.eventually_timeout_duration(),
            default_interval: config.eventually_interval_duration(),
        }
    }

    /// Runs `config` against `vars` and returns the variables it defines.
    ///
    /// A looped round trip returns one array per definition, with a null
    /// entry for every iteration its condition skipped.
    pub async fn run(
        &self,
        config: &RoundTripConfig,
        template: &RoundTripTemplate,
        vars: &VariableMap,
    ) -> Result<VariableMap, RoundTripError> {
        if config.loop_count == 0 {
            return Ok(self.run_once(config, template, vars).await?.unwrap_or_default());
        }

        let placeholder: VariableMap = config
            .definitions
            .iter()
            .map(|d| (d.name.clone(), Variable::Null))
            .collect();

        let mut combined = VariableMap::new();
        for i in 0..config.loop_count {
            let mut scope = vars.clone();
            scope.set(ITERATOR, format!("[{}]", i));
            let produced = self
                .run_once(config, template, &scope)
                .await?
                .unwrap_or_else(|| placeholder.clone());
            combined
                .merge(MergePolicy::Combine, &[&produced])
                .map_err(|e| RoundTripError::Merge {
                    description: config.description.clone(),
                    message: e.to_string(),
                })?;
        }
        Ok(combined)
    }

    /// Runs one iteration. Returns `None` when the condition skipped it.
    async fn run_once(
        &self,
        config: &RoundTripConfig,
        template: &RoundTripTemplate,
        vars: &VariableMap,
    ) -> Result<Option<VariableMap>, RoundTripError> {
        let renderer = Renderer::new(vars, self.functions);
        if let Some(when) = &config.when {
            if !evaluate(&renderer.render_when(when)?, vars)? {
                return Ok(None);
            }
        }

        let rt = renderer.render_round_trip(config, template)?;
        self.execute(&rt).await.map(Some)
    }

    /// Sends a rendered round trip and checks the response.
    pub async fn execute(&self, rt: &RoundTrip) -> Result<VariableMap, RoundTripError> {
        let request = rt.to_request().map_err(RoundTripError::Invalid)?;
        log::info!("STEP: {}: {}", rt.description, request);

        let matcher = ResponseMatcher::new(rt)?;
        let client = self.clients.get(rt.client.as_deref())?;

        let Some(eventually) = rt.response.eventually else {
            let response = client.execute(&request).await?;
            return matcher
                .check(&response)
                .map_err(|failures| mismatch(rt, &request, failures));
        };

        let timeout = eventually.timeout.unwrap_or(self.default_timeout);
        let interval = eventually.interval.unwrap_or(self.default_interval);
        poll(client, &request, &matcher, timeout, interval)
            .await
            .map_err(|failures| mismatch(rt, &request, failures))
    }
}

/// Repeats request and check until a match or until `timeout` has elapsed.
/// Transport errors count as not matched yet.
async fn poll(
    client: &HttpClient,
    request: &HttpRequest,
    matcher: &ResponseMatcher,
    timeout: Duration,
    interval: Duration,
) -> Result<VariableMap, Vec<MatchFailure>> {
    let deadline = Instant::now() + timeout;
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let failures = match client.execute(request).await {
            Ok(response) => match matcher.check(&response) {
                Ok(vars) => return Ok(vars),
                Err(failures) => failures,
            },
            Err(e) => vec![MatchFailure::new(format!("request failed: {}", e))],
        };

        let now = Instant::now();
        if now >= deadline {
            log::debug!("{} still not matched after {} attempts", request, attempt);
            let mut failures = failures;
            failures.push(MatchFailure::new(format!(
                "timed out after {:?} ({} attempts)",
                timeout, attempt
            )));
            return Err(failures);
        }
        let wait = interval.min(deadline - now);
        log::debug!("attempt {} of {} didn't match, retrying in {:?}", attempt, request, wait);
        tokio::time::sleep(wait).await;
    }
}

fn mismatch(rt: &RoundTrip, request: &HttpRequest, failures: Vec<MatchFailure>) -> RoundTripError {
    RoundTripError::Mismatch(Box::new(Mismatch {
        description: rt.description.clone(),
        request: request.to_string(),
        failures,
    }))
}
