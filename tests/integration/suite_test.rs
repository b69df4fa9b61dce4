//! End-to-end suite runs.

use super::{host_of, init_test_env, DataTree, HOST_CONTEXT};
use aloe::cleaner::{CleanError, Cleaner};
use aloe::config::RunnerConfig;
use aloe::models::RoundTripTemplate;
use aloe::preset::{PresetError, Presetter};
use aloe::template::{Argument, TemplateError};
use aloe::{Framework, Outcome, Variable};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn framework(server: &MockServer, config: RunnerConfig) -> Framework {
    init_test_env();
    let mut framework = Framework::new(config).unwrap();
    framework.env("host", host_of(server)).unwrap();
    framework
}

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Cleaner for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    async fn clean(
        &self,
        template: &RoundTripTemplate,
        args: &IndexMap<String, String>,
    ) -> Result<(), CleanError> {
        if template.request.host.is_none() {
            return Err(CleanError::new("template has no host"));
        }
        let tag = args
            .get("tag")
            .ok_or_else(|| CleanError::new("tag is not defined"))?;
        self.calls.lock().unwrap().push(tag.clone());
        Ok(())
    }
}

struct Tenant;

impl Presetter for Tenant {
    fn name(&self) -> &str {
        "tenant"
    }

    fn preset(
        &self,
        mut template: RoundTripTemplate,
        args: &IndexMap<String, String>,
    ) -> Result<RoundTripTemplate, PresetError> {
        let id = args
            .get("id")
            .ok_or_else(|| PresetError::MissingArg("id".to_string()))?;
        template.request.set_header("X-Tenant", id.clone());
        Ok(template)
    }
}

fn upper(args: &[Argument]) -> Result<String, TemplateError> {
    let [arg] = args else {
        return Err(TemplateError::Function {
            name: "upper".to_string(),
            message: "expects one argument".to_string(),
        });
    };
    Ok(arg.text().unwrap_or_default().to_uppercase())
}

/// Answers 404 until `ready_after` requests have been served.
struct Flaky {
    calls: Arc<AtomicUsize>,
    ready_after: usize,
}

impl Respond for Flaky {
    fn respond(&self, _: &Request) -> ResponseTemplate {
        if self.calls.fetch_add(1, Ordering::SeqCst) + 1 >= self.ready_after {
            ResponseTemplate::new(200).set_body_json(json!({"state": "done"}))
        } else {
            ResponseTemplate::new(404)
        }
    }
}

#[tokio::test]
async fn test_exported_token_flows_into_nested_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"user": "ann"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t-1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .and(header("Authorization", "Bearer t-1"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "ann",
            "roles": ["admin", "dev"],
            "createdAt": "2024-01-01"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/greetings"))
        .and(body_json(json!({"to": "ann"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let tree = DataTree::new();
    tree.file(
        "api/_context.yaml",
        r#"
summary: api
presetters:
  - name: host
    args:
      host: "%{host}"
  - name: requestHeader
    args:
      content-type: application/json
flow:
  - description: login
    request:
      api: POST /login
      body: '{"user": "ann"}'
    response:
      statusCode: 200
    definitions:
      - name: session
        selector: [token]
exports:
  - name: token
    selector: [session]
"#,
    )
    .file(
        "api/users/_context.yaml",
        r#"
summary: users
presetter:
  - name: bearerAuth
    args:
      token: "%{token}"
"#,
    )
    .file(
        "api/users/get.yaml",
        r#"
summary: get user
flow:
  - description: fetch user
    request:
      api: GET /users/1
    response:
      statusCode: 200
      body: '{"name": {"$regexp": "^an"}, "roles": {"$len": 2}}'
    definitions:
      - name: name
        selector: [name]
  - description: greet user
    request:
      api: POST /greetings
      body: '{"to": "%{name}"}'
    response:
      statusCode: 201
"#,
    );

    let mut framework = framework(&server, RunnerConfig::default());
    framework.append_data_dirs([tree.join("api")]);
    let report = framework.run().await.unwrap();

    assert_eq!(report.passed(), 1, "{}", report);
    assert_eq!(
        report.cases[0].breadcrumb,
        vec!["api: api", "users: users", "get.yaml: get user"]
    );
}

#[tokio::test]
async fn test_loop_collects_ids_with_skipped_iteration() {
    let server = MockServer::start().await;
    for i in 0..3 {
        Mock::given(method("POST"))
            .and(path(format!("/items/{}", i)))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": i * 10})))
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/batches"))
        .and(body_json(json!({"ids": [0, null, 20]})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let tree = DataTree::new();
    tree.file("_context.yaml", HOST_CONTEXT).file(
        "loop.yaml",
        r#"
flow:
  - description: create items
    loop: 3
    when:
      expr: iterator != skipped
    request:
      api: POST /items/%{select(indexes, iterator)}
    response:
      statusCode: 201
    definitions:
      - name: id
        selector: [id]
  - description: create batch
    request:
      api: POST /batches
      body: '{"ids": %{id}}'
    response:
      statusCode: 200
"#,
    );

    let mut framework = framework(&server, RunnerConfig::default());
    framework.env("skipped", "[1]").unwrap();
    framework
        .env(
            "indexes",
            Variable::from(vec![Variable::from(0), Variable::from(1), Variable::from(2)]),
        )
        .unwrap();
    framework.append_data_dirs([tree.path()]);
    let report = framework.run().await.unwrap();

    assert!(report.is_success(), "{}", report);
}

#[tokio::test]
async fn test_export_shadowing_fails_case_before_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "x"})))
        .expect(0)
        .mount(&server)
        .await;

    let tree = DataTree::new();
    tree.file(
        "_context.yaml",
        r#"
presetters:
  - name: host
    args:
      host: "%{host}"
flow:
  - request:
      api: POST /login
    definitions:
      - name: session
        selector: [token]
exports:
  - name: token
    selector: [session]
"#,
    )
    .file("case.yaml", "summary: anything\n");

    let mut framework = framework(&server, RunnerConfig::default());
    framework.env("token", "from-env").unwrap();
    framework.append_data_dirs([tree.path()]);
    let report = framework.run().await.unwrap();

    assert_eq!(report.failed(), 1);
    let (_, message) = report.failures().next().unwrap();
    assert_eq!(
        message,
        "can't export token: variable token has been defined in parent contexts"
    );
}

#[tokio::test]
async fn test_cleaners_run_per_case_and_after_last_selected_case() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let tree = DataTree::new();
    tree.file(
        "_context.yaml",
        r#"
presetters:
  - name: host
    args:
      host: "%{host}"
cleaners:
  - name: recorder
    forEach: true
    args:
      tag: each
  - name: recorder
    args:
      tag: last
"#,
    )
    .file("a.yaml", "flow:\n  - request: {api: GET /a}\n")
    .file("b.yaml", "flow:\n  - request: {api: GET /b}\n")
    .file("c.yaml", "labels: [slow]\nflow:\n  - request: {api: GET /c}\n");

    let recorder = Recorder::default();
    let config = RunnerConfig {
        skip: "slow".to_string(),
        ..RunnerConfig::default()
    };
    let mut framework = framework(&server, config);
    framework.register_cleaner(recorder.clone()).unwrap();
    framework.append_data_dirs([tree.path()]);
    let report = framework.run().await.unwrap();

    assert_eq!((report.passed(), report.skipped()), (2, 1), "{}", report);
    assert_eq!(report.cases[2].outcome, Outcome::Skipped);
    assert_eq!(*recorder.calls.lock().unwrap(), vec!["each", "each", "last"]);
}

#[tokio::test]
async fn test_focus_leaves_unselected_contexts_inactive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/smoke"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orders/setup"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let tree = DataTree::new();
    tree.file("_context.yaml", HOST_CONTEXT)
        .file(
            "smoke.yaml",
            "labels: [smoke, slow]\nflow:\n  - request: {api: GET /smoke}\n    response: {statusCode: 200}\n",
        )
        .file(
            "orders/_context.yaml",
            "flow:\n  - request: {api: POST /orders/setup}\n",
        )
        .file("orders/list.yaml", "labels: [slow]\n");

    let config = RunnerConfig {
        focus: "smoke".to_string(),
        skip: "slow".to_string(),
        ..RunnerConfig::default()
    };
    let mut framework = framework(&server, config);
    framework.append_data_dirs([tree.path()]);
    let report = framework.run().await.unwrap();

    assert_eq!((report.passed(), report.skipped()), (1, 1), "{}", report);
}

#[tokio::test]
async fn test_eventually_round_trip_polls_until_done() {
    let server = MockServer::start().await;
    let calls = Arc::new(AtomicUsize::new(0));
    Mock::given(method("GET"))
        .and(path("/jobs/1"))
        .respond_with(Flaky {
            calls: calls.clone(),
            ready_after: 3,
        })
        .mount(&server)
        .await;

    let tree = DataTree::new();
    tree.file("_context.yaml", HOST_CONTEXT).file(
        "job.yaml",
        r#"
flow:
  - description: wait for job
    request:
      api: GET /jobs/1
    response:
      statusCode: 200
      body: '{"state": "done"}'
      eventually:
        timeout: 2s
        interval: 20ms
"#,
    );

    let mut framework = framework(&server, RunnerConfig::default());
    framework.append_data_dirs([tree.path()]);
    let report = framework.run().await.unwrap();

    assert!(report.is_success(), "{}", report);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_failed_case_is_reported_and_siblings_still_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/healthy"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let tree = DataTree::new();
    tree.file("_context.yaml", HOST_CONTEXT)
        .file(
            "a_broken.yaml",
            "flow:\n  - description: call broken\n    request: {api: GET /broken}\n    response: {statusCode: 200}\n",
        )
        .file(
            "b_healthy.yaml",
            "flow:\n  - request: {api: GET /healthy}\n    response: {statusCode: 200}\n",
        );

    let mut framework = framework(&server, RunnerConfig::default());
    framework.append_data_dirs([tree.path()]);
    let report = framework.run().await.unwrap();

    assert_eq!((report.passed(), report.failed()), (1, 1));
    let (case, message) = report.failures().next().unwrap();
    assert!(case.name().ends_with("a_broken.yaml"));
    assert!(message.starts_with("call broken\nGET http://"), "{}", message);
    assert!(message.contains("status code is not matched, expected: 200, actual: 500"));
    assert!(message.contains("api status: boom"));
    assert!(report.to_string().contains("1 passed, 1 failed, 0 skipped"));
}

#[tokio::test]
async fn test_custom_presetter_function_and_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/shout"))
        .and(header("X-Tenant", "acme"))
        .and(header("X-Client", "special"))
        .and(body_json(json!({"text": "HELLO"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let tree = DataTree::new();
    tree.file(
        "_context.yaml",
        r#"
presetters:
  - name: host
    args:
      host: "%{host}"
  - name: tenant
    args:
      id: acme
"#,
    )
    .file(
        "shout.yaml",
        r#"
flow:
  - client: special
    request:
      api: POST /shout
      body: '{"text": "%{upper(`hello`)}"}'
    response:
      statusCode: 200
"#,
    );

    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert("X-Client", reqwest::header::HeaderValue::from_static("special"));
    let client = reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .unwrap();

    let mut framework = framework(&server, RunnerConfig::default());
    framework.register_presetter(Tenant).unwrap();
    framework.register_function("upper", upper).unwrap();
    framework.register_client("special", client).unwrap();
    framework.append_data_dirs([tree.path()]);
    let report = framework.run().await.unwrap();

    assert!(report.is_success(), "{}", report);
}

#[tokio::test]
async fn test_invalid_data_aborts_run() {
    let server = MockServer::start().await;
    let tree = DataTree::new();
    tree.file(
        "_context.yaml",
        "validatedFlow:\n  - constructor: []\n    validator: []\n",
    )
    .file("case.yaml", "summary: never runs\n");

    let mut framework = framework(&server, RunnerConfig::default());
    framework.append_data_dirs([tree.path()]);
    let err = framework.run().await.unwrap_err();

    assert!(err
        .to_string()
        .contains("validatedFlow[0]: constructor and validator should not be empty"));
}

#[tokio::test]
async fn test_unknown_cleaner_aborts_run_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/setup"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let tree = DataTree::new();
    tree.file(
        "_context.yaml",
        r#"
presetters:
  - name: host
    args:
      host: "%{host}"
flow:
  - request:
      api: POST /setup
"#,
    )
    .file("a.yaml", "summary: runs first\n")
    .file("sub/_context.yaml", "cleaners:\n  - name: dropDb\n")
    .file("sub/b.yaml", "summary: needs dropDb\n");

    let mut framework = framework(&server, RunnerConfig::default());
    framework.append_data_dirs([tree.path()]);
    let err = framework.run().await.unwrap_err();

    assert!(matches!(err, aloe::FrameworkError::Collaborator { .. }));
    assert!(err.to_string().ends_with("can't get cleaner called dropDb"));
    let received = server.received_requests().await.unwrap();
    assert!(received.is_empty());
}
