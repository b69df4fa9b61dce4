//! The process-wide default framework.

use super::{host_of, init_test_env, DataTree, HOST_CONTEXT};
use aloe::config::RunnerConfig;
use aloe::framework::global;
use serial_test::serial;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn start_server() -> (tokio::runtime::Runtime, MockServer) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"pong": true}"#))
            .mount(&server)
            .await;
        server
    });
    (runtime, server)
}

#[test]
#[serial]
fn test_default_framework_runs_registered_dirs() {
    init_test_env();
    let (_runtime, server) = start_server();
    let tree = DataTree::new();
    tree.file("_context.yaml", HOST_CONTEXT).file(
        "ping.yaml",
        "flow:\n  - request: {api: GET /ping}\n    response:\n      statusCode: 200\n      body: '{\"pong\": true}'\n",
    );

    global::configure(RunnerConfig::default()).unwrap();
    aloe::env("host", host_of(&server)).unwrap();
    aloe::append_data_dirs([tree.path()]).unwrap();
    let report = aloe::run();

    assert_eq!(report.passed(), 1);
    global::reset();
}

#[test]
#[serial]
fn test_default_framework_reports_failures() {
    init_test_env();
    let (_runtime, server) = start_server();
    let tree = DataTree::new();
    tree.file("_context.yaml", HOST_CONTEXT).file(
        "ping.yaml",
        "flow:\n  - request: {api: GET /ping}\n    response: {statusCode: 204}\n",
    );

    global::configure(RunnerConfig::default()).unwrap();
    aloe::env("host", host_of(&server)).unwrap();
    aloe::append_data_dirs([tree.path()]).unwrap();
    let report = global::try_run().unwrap();

    assert_eq!(report.failed(), 1);
    assert!(std::panic::catch_unwind(aloe::run).is_err());
    global::reset();
}
