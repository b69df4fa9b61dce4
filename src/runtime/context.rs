//! Context activation and teardown.

use super::{CleanerTable, ContextError, PresetterTable, Runtime, ScopeChain};
use crate::cleaner::CleanerCall;
use crate::config::{CaseConfig, ContextConfig, RoundTripConfig};
use crate::models::RoundTripTemplate;
use crate::roundtrip::Renderer;
use crate::variables::{MergePolicy, VariableMap};
use std::sync::{Mutex, MutexGuard};

/// What an activated context hands down to its children and cases.
#[derive(Debug, Clone, Default)]
pub struct ActiveContext {
    summary: String,
    scope: ScopeChain,
    template: RoundTripTemplate,
}

impl ActiveContext {
    /// The outermost context: environment variables and an empty template.
    pub fn root(env: VariableMap) -> Self {
        Self {
            summary: String::new(),
            scope: ScopeChain::root(env),
            template: RoundTripTemplate::default(),
        }
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn scope(&self) -> &ScopeChain {
        &self.scope
    }

    pub fn template(&self) -> &RoundTripTemplate {
        &self.template
    }
}

#[derive(Debug, Clone)]
struct Teardown {
    template: RoundTripTemplate,
    cleaners: Vec<CleanerCall>,
}

#[derive(Debug, Default)]
struct NodeState {
    /// Exports of the last successful activation.
    exports: VariableMap,
    /// Set once an activation has succeeded; validated flows then check
    /// before reconstructing.
    constructed: bool,
    finished: usize,
    teardown: Option<Teardown>,
}

/// One test-data directory's context, shared by every case under it.
#[derive(Debug)]
pub struct ContextNode {
    summary: String,
    config: ContextConfig,
    total: usize,
    state: Mutex<NodeState>,
}

impl ContextNode {
    /// `total` is the number of selected cases in the node's subtree.
    pub fn new(summary: impl Into<String>, config: ContextConfig, total: usize) -> Self {
        Self {
            summary: summary.into(),
            config,
            total,
            state: Mutex::new(NodeState::default()),
        }
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Cases finished so far.
    pub fn finished(&self) -> Result<usize, ContextError> {
        Ok(self.lock()?.finished)
    }

    /// Exports of the last successful activation.
    pub fn exports(&self) -> Result<VariableMap, ContextError> {
        Ok(self.lock()?.exports.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, NodeState>, ContextError> {
        self.state
            .lock()
            .map_err(|_| ContextError::Poisoned(self.summary.clone()))
    }

    /// Rebuilds this context on top of `parent` for the next case.
    ///
    /// The variables seen by the flows are the parent scope plus the exports
    /// of the previous activation. Children only see the parent scope plus
    /// this activation's exports.
    pub async fn activate(
        &self,
        parent: &ActiveContext,
        rt: &Runtime<'_>,
    ) -> Result<ActiveContext, ContextError> {
        self.check_collaborators(rt.presetters, rt.cleaners)?;
        if let Some(export) = self
            .config
            .exports
            .iter()
            .find(|e| parent.scope.contains(&e.name))
        {
            return Err(ContextError::ExportShadows {
                name: export.name.clone(),
            });
        }

        let (prior, constructed) = {
            let state = self.lock()?;
            (state.exports.clone(), state.constructed)
        };
        let parent_vars = parent.scope.materialize();
        let mut vars = parent_vars.merged(MergePolicy::Conflict, &[&prior])?;
        let template = self.preset(parent.template.clone(), &vars, rt)?;

        let mut produced = VariableMap::new();
        run_flow(&self.config.flow, &template, &parent_vars, &mut produced, &mut vars, rt).await?;

        for (i, validated) in self.config.validated_flow.iter().enumerate() {
            if constructed {
                let mut produced = VariableMap::new();
                let mut checked = vars.clone();
                match run_flow(&validated.validator, &template, &parent_vars, &mut produced, &mut checked, rt)
                    .await
                {
                    Ok(()) => {
                        vars = checked;
                        continue;
                    }
                    Err(e) if e.is_mismatch() => {
                        log::info!(
                            "{}: validatedFlow[{}] is stale, constructing again: {}",
                            self.summary,
                            i,
                            e
                        );
                    }
                    Err(e) => return Err(e),
                }
            }
            let mut produced = VariableMap::new();
            run_flow(&validated.constructor, &template, &parent_vars, &mut produced, &mut vars, rt)
                .await?;
            run_flow(&validated.validator, &template, &parent_vars, &mut produced, &mut vars, rt)
                .await?;
        }

        let exports = self.export(&vars, rt)?;
        // Cleaners may refer to exports that weren't in scope yet.
        let vars = vars.merged(MergePolicy::Overwrite, &[&exports])?;
        let renderer = Renderer::new(&vars, rt.functions);
        let mut cleaners = Vec::with_capacity(self.config.cleaners.len());
        for cleaner in &self.config.cleaners {
            cleaners.push(CleanerCall {
                name: cleaner.name.clone(),
                for_each: cleaner.for_each,
                args: renderer.render_args(&format!("cleaner {}", cleaner.name), &cleaner.args)?,
            });
        }

        log::debug!("{}: activated, exports {:?}", self.summary, exports.to_strings());
        let scope = parent.scope.push(exports.clone())?;
        {
            let mut state = self.lock()?;
            state.exports = exports;
            state.constructed = true;
            state.teardown = Some(Teardown {
                template: template.clone(),
                cleaners,
            });
        }

        Ok(ActiveContext {
            summary: self.summary.clone(),
            scope,
            template,
        })
    }

    /// Records that a case under this context finished and runs the cleaners
    /// that are due.
    ///
    /// `activated` tells whether this context was activated for the case.
    /// For-each cleaners only run when it was; the others run once the last
    /// selected case of the subtree has finished, using the last successful
    /// activation.
    pub async fn finish_case(&self, activated: bool, rt: &Runtime<'_>) -> Result<(), ContextError> {
        let due = {
            let mut state = self.lock()?;
            state.finished += 1;
            let last = state.finished == self.total;
            state.teardown.as_ref().map(|teardown| {
                let calls: Vec<CleanerCall> = teardown
                    .cleaners
                    .iter()
                    .filter(|c| if c.for_each { activated } else { last })
                    .cloned()
                    .collect();
                (teardown.template.clone(), calls)
            })
        };
        let Some((template, calls)) = due else {
            return Ok(());
        };

        let mut result = Ok(());
        for call in calls {
            let Some(cleaner) = rt.cleaners.get(&call.name) else {
                result = result.and(Err(ContextError::UnknownCleaner(call.name.clone())));
                continue;
            };
            log::info!("{}: cleaning with {}", self.summary, call.name);
            if let Err(source) = cleaner.clean(&template, &call.args).await {
                log::warn!("{}: cleaner {} failed: {}", self.summary, call.name, source);
                result = result.and(Err(ContextError::Clean {
                    name: call.name.clone(),
                    source,
                }));
            }
        }
        result
    }

    fn export(&self, vars: &VariableMap, rt: &Runtime<'_>) -> Result<VariableMap, ContextError> {
        let renderer = Renderer::new(vars, rt.functions);
        let mut exports = VariableMap::new();
        for export in &self.config.exports {
            if exports.contains(&export.name) {
                return Err(ContextError::Export {
                    name: export.name.clone(),
                    message: "exported twice".to_string(),
                });
            }
            let selector = if export.selector.is_empty() {
                vec![export.name.clone()]
            } else {
                renderer.render_selector(&format!("exports.{}", export.name), &export.selector)?
            };
            let value = vars.select(&selector).map_err(|e| ContextError::Export {
                name: export.name.clone(),
                message: e.to_string(),
            })?;
            exports.set(export.name.clone(), value);
        }
        Ok(exports)
    }

    /// Fails on the first presetter or cleaner name that isn't registered.
    pub fn check_collaborators(
        &self,
        presetters: &PresetterTable,
        cleaners: &CleanerTable,
    ) -> Result<(), ContextError> {
        if let Some(p) = self
            .config
            .presetters
            .iter()
            .find(|p| !presetters.contains_key(&p.name))
        {
            return Err(ContextError::UnknownPresetter(p.name.clone()));
        }
        if let Some(c) = self
            .config
            .cleaners
            .iter()
            .find(|c| !cleaners.contains_key(&c.name))
        {
            return Err(ContextError::UnknownCleaner(c.name.clone()));
        }
        Ok(())
    }

    fn preset(
        &self,
        mut template: RoundTripTemplate,
        vars: &VariableMap,
        rt: &Runtime<'_>,
    ) -> Result<RoundTripTemplate, ContextError> {
        let renderer = Renderer::new(vars, rt.functions);
        for preset in &self.config.presetters {
            let presetter = rt
                .presetters
                .get(&preset.name)
                .ok_or_else(|| ContextError::UnknownPresetter(preset.name.clone()))?;
            let args = renderer.render_args(&format!("presetter {}", preset.name), &preset.args)?;
            template = presetter
                .preset(template, &args)
                .map_err(|source| ContextError::Preset {
                    name: preset.name.clone(),
                    source,
                })?;
        }
        Ok(template)
    }
}

/// Runs a case's flow on top of `context` and returns the case scope.
pub async fn run_case(
    case: &CaseConfig,
    context: &ActiveContext,
    rt: &Runtime<'_>,
) -> Result<VariableMap, ContextError> {
    let mut vars = context.scope.materialize();
    for config in &case.flow {
        let produced = rt.runner.run(config, &context.template, &vars).await?;
        vars.merge(MergePolicy::Conflict, &[&produced])?;
    }
    Ok(vars)
}

/// Runs context round trips in order. Every round trip sees what the ones
/// before it defined. Nothing may rebind a name from `parent`, and nothing
/// may be defined twice within `produced`.
async fn run_flow(
    flow: &[RoundTripConfig],
    template: &RoundTripTemplate,
    parent: &VariableMap,
    produced: &mut VariableMap,
    vars: &mut VariableMap,
    rt: &Runtime<'_>,
) -> Result<(), ContextError> {
    for config in flow {
        let defined = rt.runner.run(config, template, vars).await?;
        let names: Vec<String> = defined
            .keys()
            .filter(|name| parent.contains(name))
            .map(String::from)
            .collect();
        if !names.is_empty() {
            return Err(ContextError::ParentConflict { names });
        }
        produced.merge(MergePolicy::Conflict, &[&defined])?;
        vars.merge(MergePolicy::DeepOverwrite, &[&defined])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::{CleanError, Cleaner};
    use crate::config::RunnerConfig;
    use crate::executor::{ClientRegistry, ExecutionConfig, HttpClient};
    use crate::preset::builtin_presetters;
    use crate::roundtrip::RoundTripRunner;
    use crate::runtime::{CleanerTable, PresetterTable};
    use crate::template::FunctionRegistry;
    use crate::variables::Variable;
    use async_trait::async_trait;
    use indexmap::IndexMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Cleaner for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn clean(
            &self,
            _: &RoundTripTemplate,
            args: &IndexMap<String, String>,
        ) -> Result<(), CleanError> {
            let id = args.get("id").cloned().unwrap_or_default();
            self.calls.lock().unwrap().push(id);
            Ok(())
        }
    }

    struct Fixture {
        clients: ClientRegistry,
        functions: FunctionRegistry,
        presetters: PresetterTable,
        cleaners: CleanerTable,
        config: RunnerConfig,
        recorder: Arc<Recorder>,
    }

    impl Fixture {
        fn new() -> Self {
            let recorder = Arc::new(Recorder::default());
            let mut cleaners = CleanerTable::new();
            cleaners.insert("recorder".to_string(), recorder.clone() as Arc<dyn Cleaner>);
            Self {
                clients: ClientRegistry::new(HttpClient::new(&ExecutionConfig::default()).unwrap()),
                functions: FunctionRegistry::with_builtins(),
                presetters: builtin_presetters()
                    .into_iter()
                    .map(|p| (p.name().to_string(), p))
                    .collect(),
                cleaners,
                config: RunnerConfig::default(),
                recorder,
            }
        }

        fn runtime(&self) -> Runtime<'_> {
            Runtime {
                runner: RoundTripRunner::new(&self.clients, &self.functions, &self.config),
                functions: &self.functions,
                presetters: &self.presetters,
                cleaners: &self.cleaners,
            }
        }

        fn cleaned(&self) -> Vec<String> {
            self.recorder.calls.lock().unwrap().clone()
        }
    }

    fn root(server: &MockServer) -> ActiveContext {
        let address = server.address();
        let mut env = VariableMap::new();
        env.set("host", format!("{}:{}", address.ip(), address.port()));
        ActiveContext::root(env)
    }

    fn context(yaml: &str) -> ContextConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    const USER_CONTEXT: &str = r#"
summary: users
presetters:
  - name: host
    args:
      host: "%{host}"
  - name: requestHeader
    args:
      x-tenant: acme
flow:
  - description: create user
    request:
      api: POST /users
    response:
      statusCode: 201
    definitions:
      - name: created
        selector: [id]
cleaners:
  - name: recorder
    forEach: true
    args:
      id: "each-%{userId}"
  - name: recorder
    args:
      id: "last-%{userId}"
exports:
  - name: userId
    selector: [created]
"#;

    async fn mount_users(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/users"))
            .and(header("X-Tenant", "acme"))
            .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"id": 7}"#))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_activation_exports_and_presets() {
        let server = MockServer::start().await;
        mount_users(&server).await;
        let fixture = Fixture::new();
        let rt = fixture.runtime();

        let node = ContextNode::new("users", context(USER_CONTEXT), 1);
        let active = node.activate(&root(&server), &rt).await.unwrap();

        assert_eq!(active.scope().get("userId"), Some(&Variable::from(7)));
        assert!(!active.scope().contains("created"));
        assert_eq!(active.template().request.headers["X-Tenant"], "acme");
        assert_eq!(node.exports().unwrap().get("userId"), Some(&Variable::from(7)));
    }

    #[tokio::test]
    async fn test_cleaners_follow_case_counter() {
        let server = MockServer::start().await;
        mount_users(&server).await;
        let fixture = Fixture::new();
        let rt = fixture.runtime();
        let node = ContextNode::new("users", context(USER_CONTEXT), 2);

        node.activate(&root(&server), &rt).await.unwrap();
        node.finish_case(true, &rt).await.unwrap();
        assert_eq!(fixture.cleaned(), vec!["each-7"]);

        node.activate(&root(&server), &rt).await.unwrap();
        node.finish_case(true, &rt).await.unwrap();
        assert_eq!(fixture.cleaned(), vec!["each-7", "each-7", "last-7"]);
        assert_eq!(node.finished().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_export_shadowing_fails_before_requests() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;
        let fixture = Fixture::new();
        let rt = fixture.runtime();

        let mut env = VariableMap::new();
        env.set("host", "localhost");
        env.set("userId", "outer");
        let node = ContextNode::new("users", context(USER_CONTEXT), 1);
        let err = node.activate(&ActiveContext::root(env), &rt).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "can't export userId: variable userId has been defined in parent contexts"
        );
    }

    #[tokio::test]
    async fn test_flow_cannot_redefine_parent_variables() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"host": "x"}"#))
            .mount(&server)
            .await;
        let fixture = Fixture::new();
        let rt = fixture.runtime();

        let node = ContextNode::new(
            "bad",
            context(
                r#"
presetters:
  - name: host
    args: {host: "%{host}"}
flow:
  - request: {api: GET /}
    definitions:
      - name: host
        selector: [host]
"#,
            ),
            1,
        );
        let err = node.activate(&root(&server), &rt).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "context define variables which have been defined in parents: host"
        );
    }

    #[tokio::test]
    async fn test_unknown_collaborators() {
        let fixture = Fixture::new();
        let rt = fixture.runtime();

        let node = ContextNode::new("x", context("presetters: [{name: tenant}]"), 1);
        let err = node.activate(&ActiveContext::default(), &rt).await.unwrap_err();
        assert_eq!(err.to_string(), "can't get presetter called tenant");

        let node = ContextNode::new("x", context("cleaners: [{name: dropDb}]"), 1);
        let err = node.activate(&ActiveContext::default(), &rt).await.unwrap_err();
        assert_eq!(err.to_string(), "can't get cleaner called dropDb");
    }

    #[tokio::test]
    async fn test_validated_flow_reconstructs_on_mismatch() {
        let server = MockServer::start().await;
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        Mock::given(method("PUT"))
            .and(path("/db"))
            .respond_with(move |_: &wiremock::Request| {
                counter.fetch_add(1, Ordering::SeqCst);
                ResponseTemplate::new(200)
            })
            .mount(&server)
            .await;
        // The database exists for the first two checks only.
        Mock::given(method("GET"))
            .and(path("/db"))
            .respond_with(ResponseTemplate::new(200))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/db"))
            .respond_with(ResponseTemplate::new(404))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/db"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let fixture = Fixture::new();
        let rt = fixture.runtime();
        let node = ContextNode::new(
            "db",
            context(
                r#"
presetters:
  - name: host
    args: {host: "%{host}"}
validatedFlow:
  - constructor:
      - request: {api: PUT /db}
        response: {statusCode: 200}
    validator:
      - request: {api: GET /db}
        response: {statusCode: 200}
"#,
            ),
            3,
        );

        // First activation: constructor, then validator (check 1).
        node.activate(&root(&server), &rt).await.unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 1);
        // Second: validator passes (check 2), nothing is constructed.
        node.activate(&root(&server), &rt).await.unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 1);
        // Third: validator fails (check 3), constructor runs, validator passes.
        node.activate(&root(&server), &rt).await.unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_run_case_conflicts_with_context_scope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"v": 1}"#))
            .mount(&server)
            .await;
        let fixture = Fixture::new();
        let rt = fixture.runtime();

        let node = ContextNode::new("x", context("presetters: [{name: host, args: {host: \"%{host}\"}}]"), 1);
        let active = node.activate(&root(&server), &rt).await.unwrap();

        let case: CaseConfig = serde_yaml::from_str(
            "flow:\n  - request: {api: GET /a}\n    definitions: [{name: v, selector: [v]}]\n",
        )
        .unwrap();
        let vars = run_case(&case, &active, &rt).await.unwrap();
        assert_eq!(vars.get("v"), Some(&Variable::from(1)));

        let case: CaseConfig = serde_yaml::from_str(
            "flow:\n  - request: {api: GET /a}\n    definitions: [{name: host, selector: [v]}]\n",
        )
        .unwrap();
        let err = run_case(&case, &active, &rt).await.unwrap_err();
        assert_eq!(err.to_string(), "variable host has been defined");
    }
}
