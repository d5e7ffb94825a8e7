// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fx_adapters::FakeFunctionRunner;
use tokio::sync::oneshot;

const GRACE: Duration = Duration::from_secs(5);

#[tokio::test(start_paused = true)]
async fn stuck_executor_is_aborted_after_grace() {
    let runner = FakeFunctionRunner::new();
    let reclaimer = Reclaimer::new(runner.clone(), GRACE);
    let (guard, dropped) = oneshot::channel::<()>();
    let executor = tokio::spawn(async move {
        let _guard = guard;
        std::future::pending::<Outcome>().await
    });

    reclaimer.reclaim("call-1".to_string(), executor);
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(reclaimer.pending(), 1);
    assert!(runner.reclaimed().is_empty());

    // The guard only drops when the task is aborted
    assert!(dropped.await.is_err());
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(runner.reclaimed(), ["call-1"]);
    assert_eq!(reclaimer.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn executor_that_stops_in_time_is_reclaimed_without_abort() {
    let runner = FakeFunctionRunner::new();
    let reclaimer = Reclaimer::new(runner.clone(), GRACE);
    let (done, finished) = oneshot::channel::<()>();
    let executor = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let _ = done.send(());
        Outcome::Cancelled
    });

    reclaimer.reclaim("call-1".to_string(), executor);
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(finished.await.is_ok());
    assert_eq!(runner.reclaimed(), ["call-1"]);
    assert_eq!(reclaimer.pending(), 0);
}
