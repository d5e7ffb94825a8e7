// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime tests

use super::*;
use crate::{CallRequest, Submission};
use fx_adapters::{FakeFunction, FakeFunctionRunner, StaticRouteRegistry};
use fx_core::{CallStatus, ExecutionMode, FakeClock, Route, SequentialIdGen};
use fx_storage::{MaterializedState, NoopJournal, Wal, WalJournal};
use std::time::Duration;
use tempfile::tempdir;

type TestRuntime = Runtime<StaticRouteRegistry, FakeFunctionRunner, FakeClock, SequentialIdGen>;

fn registry() -> StaticRouteRegistry {
    StaticRouteRegistry::from_routes([
        Route::new("myapp", "/log", "log").with_mode(ExecutionMode::Async),
        Route::new("myapp", "/slow", "slow").with_mode(ExecutionMode::Async),
        Route::new("myapp", "/hello", "hello"),
    ])
    .unwrap()
}

fn runner() -> FakeFunctionRunner {
    let runner = FakeFunctionRunner::new();
    runner
        .register("hello", FakeFunction::hello())
        .register(
            "log",
            FakeFunction::new()
                .stderr("First line\n")
                .stderr("Second line\n"),
        )
        .register(
            "slow",
            FakeFunction::new().sleep(Duration::from_secs(5)).stderr("done\n"),
        );
    runner
}

fn start(calls: Arc<CallStore>, logs: Arc<LogStore>, limits: EngineLimits) -> TestRuntime {
    Runtime::start(
        RuntimeDeps {
            registry: registry(),
            runner: runner(),
            clock: FakeClock::new(),
            ids: SequentialIdGen::default(),
            calls,
            logs,
        },
        limits,
    )
}

fn in_memory(limits: EngineLimits) -> TestRuntime {
    let logs = Arc::new(LogStore::new(limits.log_max_bytes));
    start(Arc::new(CallStore::new()), logs, limits)
}

async fn wait_for_terminal(runtime: &TestRuntime, id: &str) -> CallStatus {
    for _ in 0..200 {
        let status = runtime.query().get_status(id).unwrap().status;
        if status.is_terminal() {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("call {id} never finished");
}

#[tokio::test]
async fn async_call_completes_through_workers() {
    let runtime = in_memory(EngineLimits::for_testing());

    let submission = runtime
        .dispatcher()
        .submit(CallRequest::new("myapp", "/log"))
        .await
        .unwrap();
    let id = submission.call_id().to_string();

    assert_eq!(wait_for_terminal(&runtime, &id).await, CallStatus::Success);
    let log = runtime.query().get_log(&id).unwrap().log;
    assert!(log.contains("First line"));
    assert!(log.contains("Second line"));
    assert!(log.find("First line") < log.find("Second line"));

    runtime.shutdown().await;
}

#[tokio::test]
async fn sync_call_bypasses_the_queue() {
    let runtime = in_memory(EngineLimits::for_testing());

    let submission = runtime
        .dispatcher()
        .submit(CallRequest::new("myapp", "/hello").with_body(r#"{"Name":"John"}"#))
        .await
        .unwrap();

    match submission {
        Submission::Completed(result) => {
            assert_eq!(result.body, bytes::Bytes::from("Hello John!\n"));
        }
        other => panic!("expected completed, got {other:?}"),
    }
    assert_eq!(runtime.queued(), 0);
    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_finishes_in_flight_and_leaves_queued() {
    let limits = EngineLimits {
        workers: 1,
        ..EngineLimits::for_testing()
    };
    let runtime = in_memory(limits);
    assert_eq!(runtime.workers(), 1);

    let mut ids = Vec::new();
    for _ in 0..3 {
        let submission = runtime
            .dispatcher()
            .submit(CallRequest::new("myapp", "/slow"))
            .await
            .unwrap();
        ids.push(submission.call_id().to_string());
    }
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(runtime.queued(), 2);

    let query = runtime.query().clone();
    runtime.shutdown().await;

    assert_eq!(query.get_status(&ids[0]).unwrap().status, CallStatus::Success);
    assert_eq!(query.get_status(&ids[1]).unwrap().status, CallStatus::Queued);
    assert_eq!(query.get_status(&ids[2]).unwrap().status, CallStatus::Queued);
}

#[tokio::test]
async fn journaled_runtime_replays_to_same_state() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calls.wal");
    let limits = EngineLimits::for_testing();

    let (id, status, log) = {
        let journal = Arc::new(WalJournal::new(Wal::open(&path).unwrap()));
        let (calls, logs) = MaterializedState::new(limits.log_max_bytes, journal).into_stores();
        let runtime = start(Arc::new(calls), Arc::new(logs), limits.clone());
        let id = runtime
            .dispatcher()
            .submit(CallRequest::new("myapp", "/log"))
            .await
            .unwrap()
            .call_id()
            .to_string();
        let status = wait_for_terminal(&runtime, &id).await;
        let log = runtime.query().get_log(&id).unwrap().log;
        runtime.shutdown().await;
        (id, status, log)
    };

    let ops = Wal::replay(&path).unwrap();
    let state = MaterializedState::replay(ops, limits.log_max_bytes, Arc::new(NoopJournal));
    assert_eq!(state.calls().get(&id).unwrap().status, status);
    assert_eq!(state.logs().read(&id).unwrap(), log);
    assert!(state.interrupted().is_empty());
}
