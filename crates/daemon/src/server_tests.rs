// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use fx_adapters::{FakeFunction, FakeFunctionRunner, FakeStep, StaticRouteRegistry};
use fx_core::{EngineLimits, ExecutionMode, FakeClock, Route, SequentialIdGen};
use fx_engine::RuntimeDeps;
use fx_storage::{CallStore, LogStore};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use yare::parameterized;

type TestRuntime = Runtime<StaticRouteRegistry, FakeFunctionRunner, FakeClock, SequentialIdGen>;

struct Harness {
    app: Router,
    // Keeps the worker pool alive for the router's lifetime
    _runtime: TestRuntime,
}

fn routes() -> Vec<Route> {
    vec![
        Route::new("myapp", "/hello", "hello").with_header("Content-Type", "text/plain"),
        Route::new("myapp", "/env", "env"),
        Route::new("myapp", "/echo", "echo"),
        Route::new("myapp", "/slow", "slow"),
        Route::new("myapp", "/fail", "fail"),
        Route::new("myapp", "/log", "log").with_mode(ExecutionMode::Async),
        Route::new("myapp", "/off", "hello").disabled(),
        Route::new("other", "/hello", "hello"),
    ]
}

fn runner() -> FakeFunctionRunner {
    let runner = FakeFunctionRunner::new();
    runner
        .register("hello", FakeFunction::hello())
        .register("env", FakeFunction::new().step(FakeStep::EchoEnv("HEADER_ACCEPT".into())))
        .register("echo", FakeFunction::new().step(FakeStep::EchoBody))
        .register(
            "slow",
            FakeFunction::new()
                .stderr("starting\n")
                .sleep(Duration::from_secs(31)),
        )
        .register("fail", FakeFunction::new().stderr("boom\n").exit(2))
        .register(
            "log",
            FakeFunction::new()
                .stderr("First line\n")
                .stderr("Second line\n"),
        );
    runner
}

fn harness_with(max_body_bytes: usize) -> Harness {
    let limits = EngineLimits::for_testing();
    let runtime = Runtime::start(
        RuntimeDeps {
            registry: StaticRouteRegistry::from_routes(routes()).unwrap(),
            runner: runner(),
            clock: FakeClock::new(),
            ids: SequentialIdGen::default(),
            calls: Arc::new(CallStore::new()),
            logs: Arc::new(LogStore::new(limits.log_max_bytes)),
        },
        limits,
    );
    let app = router(ServerState::from_runtime(&runtime), max_body_bytes);
    Harness {
        app,
        _runtime: runtime,
    }
}

fn harness() -> Harness {
    harness_with(1024)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = send(app, Request::get(uri).body(Body::empty()).unwrap()).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn post(uri: &str, body: &'static str) -> Request<Body> {
    Request::post(uri).body(Body::from(body)).unwrap()
}

fn call_id(headers: &HeaderMap) -> String {
    headers[CALL_ID_HEADER].to_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_queue_and_workers() {
    let h = harness();

    let (status, body) = get_json(&h.app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["queued"], 0);
    assert_eq!(body["workers"], 2);
}

#[tokio::test]
async fn sync_invoke_returns_function_output() {
    let h = harness();

    let (status, headers, body) = send(
        &h.app,
        post("/r/myapp/hello", r#"{"Name": "John"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Bytes::from("Hello John!\n"));
    assert_eq!(headers["content-type"], "text/plain");

    let id = call_id(&headers);
    let (status, record) = get_json(&h.app, &format!("/apps/myapp/calls/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["call"]["id"], id.as_str());
    assert_eq!(record["call"]["status"], "success");
    assert_eq!(record["call"]["path"], "/hello");
}

#[tokio::test]
async fn request_body_reaches_function() {
    let h = harness();

    let (status, _, body) = send(&h.app, post("/r/myapp/echo", "ping")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Bytes::from("ping"));
}

#[tokio::test]
async fn repeated_headers_are_folded_for_the_function() {
    let h = harness();
    let request = Request::post("/r/myapp/env")
        .header("Accept", "application/xml")
        .header("Accept", "application/json; q=0.2")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Bytes::from("application/xml, application/json; q=0.2"));
}

#[tokio::test(start_paused = true)]
async fn slow_function_times_out() {
    let h = harness();

    let (status, headers, body) = send(&h.app, post("/r/myapp/slow", "")).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert!(error["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Timed out"));
    let id = call_id(&headers);
    assert_eq!(error["request_id"], id.as_str());

    let (_, record) = get_json(&h.app, &format!("/apps/myapp/calls/{id}")).await;
    assert_eq!(record["call"]["status"], "timeout");

    let (_, log) = get_json(&h.app, &format!("/apps/myapp/calls/{id}/log")).await;
    assert_eq!(log["log"]["log"], "starting\nTimed out after 30s\n");
}

#[tokio::test]
async fn function_failure_is_bad_gateway() {
    let h = harness();

    let (status, headers, body) = send(&h.app, post("/r/myapp/fail", "")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"]["message"], "function exited with code 2");
    assert_eq!(error["request_id"], call_id(&headers).as_str());
}

#[tokio::test]
async fn async_invoke_is_accepted_then_runs() {
    let h = harness();

    let (status, _, body) = send(&h.app, post("/r/myapp/log", "")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let accepted: Value = serde_json::from_slice(&body).unwrap();
    let id = accepted["call_id"].as_str().unwrap().to_string();

    let uri = format!("/apps/myapp/calls/{id}");
    let mut record = Value::Null;
    for _ in 0..100 {
        let (_, body) = get_json(&h.app, &uri).await;
        record = body;
        if record["call"]["status"] == "success" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(record["call"]["status"], "success");
    assert_eq!(record["call"]["mode"], "async");

    let (status, log) = get_json(&h.app, &format!("{uri}/log")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(log["log"]["call_id"], id.as_str());
    assert_eq!(log["log"]["log"], "First line\nSecond line\n");
}

#[parameterized(
    unknown_app = { "/r/nope/hello", StatusCode::NOT_FOUND },
    unknown_route = { "/r/myapp/missing", StatusCode::NOT_FOUND },
    disabled_route = { "/r/myapp/off", StatusCode::BAD_REQUEST },
)]
#[test_macro(tokio::test)]
async fn invoke_rejections(uri: &str, expected: StatusCode) {
    let h = harness();

    let (status, headers, body) = send(&h.app, post(uri, "")).await;

    assert_eq!(status, expected);
    assert!(headers.get(CALL_ID_HEADER).is_none());
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert!(error["error"]["message"].is_string());
    assert!(error.get("request_id").is_none());
}

#[parameterized(
    unknown_call = { "/apps/myapp/calls/call-999" },
    unknown_log = { "/apps/myapp/calls/call-999/log" },
    other_app = { "/apps/other/calls/call-1" },
    other_app_log = { "/apps/other/calls/call-1/log" },
)]
#[test_macro(tokio::test)]
async fn unknown_calls_are_not_found(uri: &str) {
    let h = harness();
    // call-1 belongs to myapp
    let (status, _, _) = send(&h.app, post("/r/myapp/hello", "")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get_json(&h.app, uri).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn list_calls_filters_by_path() {
    let h = harness();
    send(&h.app, post("/r/myapp/hello", "")).await;
    send(&h.app, post("/r/myapp/echo", "x")).await;
    send(&h.app, post("/r/other/hello", "")).await;

    let (status, all) = get_json(&h.app, "/apps/myapp/calls").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["calls"].as_array().unwrap().len(), 2);

    let (_, hello) = get_json(&h.app, "/apps/myapp/calls?path=hello").await;
    let hello = hello["calls"].as_array().unwrap();
    assert_eq!(hello.len(), 1);
    assert_eq!(hello[0]["path"], "/hello");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let h = harness_with(8);

    let (status, _, _) = send(&h.app, post("/r/myapp/echo", "far more than eight bytes")).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
