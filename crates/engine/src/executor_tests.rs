// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fx_adapters::{FakeFunction, FakeFunctionRunner, FakeStep};
use fx_core::{ExecutionMode, FakeClock, Headers};
use std::time::Duration;

const BODY_MAX: usize = 1024;

fn call_with_headers(headers: Headers) -> Call {
    call_in(ExecutionMode::Sync, headers)
}

fn call_in(mode: ExecutionMode, headers: Headers) -> Call {
    Call::new("call-1", "myapp", "/hello", mode, headers, &FakeClock::new())
}

fn invocation_for(image: &str, body: &str) -> Invocation {
    invocation_in(ExecutionMode::Sync, image, body)
}

fn invocation_in(mode: ExecutionMode, image: &str, body: &str) -> Invocation {
    let route = Route::new("myapp", "/hello", image).with_mode(mode);
    let request = CallRequest::new("myapp", "/hello").with_body(body.to_string());
    invocation(&call_in(mode, Headers::new()), &route, request)
}

#[tokio::test]
async fn stdout_is_body_and_stderr_is_log() {
    let runner = FakeFunctionRunner::new();
    runner.register(
        "hello",
        FakeFunction::hello().stderr("First line\n").stderr("Second line\n"),
    );
    let executor = Executor::new(runner, BODY_MAX);
    let log = LogBuffer::new(1024);

    let outcome = executor
        .run(
            invocation_for("hello", r#"{"Name":"John"}"#),
            &log,
            CancellationToken::new(),
        )
        .await;

    assert_eq!(
        outcome,
        Outcome::Success {
            body: Bytes::from("Hello John!\n"),
            exit: ExitInfo { code: 0 },
        }
    );
    assert_eq!(log.read(), "First line\nSecond line\n");
}

#[tokio::test]
async fn nonzero_exit_is_an_error() {
    let runner = FakeFunctionRunner::new();
    runner.register("fail", FakeFunction::new().stderr("boom\n").exit(3));
    let executor = Executor::new(runner, BODY_MAX);
    let log = LogBuffer::new(1024);

    let outcome = executor
        .run(invocation_for("fail", ""), &log, CancellationToken::new())
        .await;

    match outcome {
        Outcome::Error { exit, message, .. } => {
            assert_eq!(exit, Some(ExitInfo { code: 3 }));
            assert!(message.contains("code 3"));
        }
        other => panic!("expected error, got {other:?}"),
    }
    assert_eq!(log.read(), "boom\n");
}

#[tokio::test]
async fn start_failure_is_logged_as_error() {
    let executor = Executor::new(FakeFunctionRunner::new(), BODY_MAX);
    let log = LogBuffer::new(1024);

    let outcome = executor
        .run(invocation_for("missing", ""), &log, CancellationToken::new())
        .await;

    assert!(matches!(outcome, Outcome::Error { exit: None, .. }));
    assert!(log.read().contains("image not found: missing"));
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_forwarding() {
    let runner = FakeFunctionRunner::new();
    runner.register(
        "slow",
        FakeFunction::new()
            .stderr("before\n")
            .sleep(Duration::from_secs(60))
            .stderr("after\n"),
    );
    let executor = Executor::new(runner, BODY_MAX);
    let log = std::sync::Arc::new(LogBuffer::new(1024));
    let cancel = CancellationToken::new();

    let handle = tokio::spawn({
        let executor = executor.clone();
        let log = log.clone();
        let cancel = cancel.clone();
        async move {
            executor
                .run(invocation_for("slow", ""), &log, cancel)
                .await
        }
    });
    tokio::time::sleep(Duration::from_secs(1)).await;
    cancel.cancel();

    assert_eq!(handle.await.unwrap(), Outcome::Cancelled);
    assert_eq!(log.read(), "before\n");
}

#[tokio::test]
async fn already_cancelled_never_starts() {
    let runner = FakeFunctionRunner::new();
    runner.register("hello", FakeFunction::hello());
    let executor = Executor::new(runner.clone(), BODY_MAX);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = executor
        .run(invocation_for("hello", ""), &LogBuffer::new(16), cancel)
        .await;

    assert_eq!(outcome, Outcome::Cancelled);
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn log_flood_is_capped() {
    let runner = FakeFunctionRunner::new();
    runner.register("flood", FakeFunction::new().step(FakeStep::FloodStderr(10_000)));
    let executor = Executor::new(runner, BODY_MAX);
    let log = LogBuffer::new(1000);

    let outcome = executor
        .run(invocation_for("flood", ""), &log, CancellationToken::new())
        .await;

    assert!(matches!(outcome, Outcome::Success { .. }));
    assert_eq!(log.read().len(), 1000);
    assert!(log.is_truncated());
}

fn flood_runner() -> FakeFunctionRunner {
    let runner = FakeFunctionRunner::new();
    runner.register(
        "flood",
        FakeFunction::new()
            .stdout("a".repeat(1000))
            .stdout("b".repeat(1000))
            .stdout("c".repeat(1000)),
    );
    runner
}

#[tokio::test]
async fn sync_body_is_capped() {
    let executor = Executor::new(flood_runner(), BODY_MAX);

    let outcome = executor
        .run(
            invocation_in(ExecutionMode::Sync, "flood", ""),
            &LogBuffer::new(16),
            CancellationToken::new(),
        )
        .await;

    match outcome {
        Outcome::Success { body, .. } => {
            assert_eq!(body.len(), BODY_MAX);
            assert!(body[..1000].iter().all(|b| *b == b'a'));
            assert!(body[1000..].iter().all(|b| *b == b'b'));
        }
        other => panic!("expected success, got {other:?}"),
    }
}

#[tokio::test]
async fn async_stdout_is_not_kept() {
    let executor = Executor::new(flood_runner(), BODY_MAX);

    let outcome = executor
        .run(
            invocation_in(ExecutionMode::Async, "flood", ""),
            &LogBuffer::new(16),
            CancellationToken::new(),
        )
        .await;

    assert_eq!(
        outcome,
        Outcome::Success {
            body: Bytes::new(),
            exit: ExitInfo { code: 0 },
        }
    );
}

#[test]
fn invocation_env_order() {
    let headers: Headers = [
        ("ACCEPT", "application/xml"),
        ("Content-Type", "application/json"),
        ("ACCEPT", "application/json; q=0.2"),
    ]
    .into_iter()
    .collect();
    let call = call_with_headers(headers);
    let route = Route::new("myapp", "/hello", "hello").with_config("GREETING", "hi");
    let request = CallRequest::new("myapp", "/hello")
        .with_url("http://localhost/r/myapp/hello")
        .with_body("payload");

    let invocation = invocation(&call, &route, request);

    let names: Vec<&str> = invocation.env.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(
        names,
        [
            "GREETING",
            "FN_APP_NAME",
            "FN_PATH",
            "FN_METHOD",
            "FN_REQUEST_URL",
            "FN_CALL_ID",
            "FN_MEMORY",
            "FN_TYPE",
            "HEADER_ACCEPT",
            "HEADER_CONTENT_TYPE",
        ]
    );
    let env = |name: &str| {
        invocation
            .env
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .unwrap()
    };
    assert_eq!(env("HEADER_ACCEPT"), "application/xml, application/json; q=0.2");
    assert_eq!(env("FN_TYPE"), "sync");
    assert_eq!(env("FN_MEMORY"), "128");
    assert_eq!(env("FN_REQUEST_URL"), "http://localhost/r/myapp/hello");
    assert_eq!(invocation.body, Bytes::from("payload"));
}
