// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background cleanup of timed-out runs

use crate::Outcome;
use fx_adapters::FunctionRunner;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Releases what an abandoned run still holds.
///
/// The executor gets `grace` to notice its cancellation before its task is
/// aborted; the runner is then told to reclaim the call. Executors stop on
/// cancellation, so the abort only fires for a runner whose event stream
/// never ends. Nothing waits on this: the timeout is already committed when
/// a reclaim starts.
#[derive(Clone)]
pub struct Reclaimer<F> {
    runner: F,
    grace: Duration,
    pending: Arc<AtomicUsize>,
}

impl<F: FunctionRunner> Reclaimer<F> {
    pub fn new(runner: F, grace: Duration) -> Self {
        Self {
            runner,
            grace,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn reclaim(&self, call_id: String, mut executor: JoinHandle<Outcome>) {
        let runner = self.runner.clone();
        let grace = self.grace;
        let pending = Arc::clone(&self.pending);
        pending.fetch_add(1, Ordering::SeqCst);

        tokio::spawn(async move {
            if tokio::time::timeout(grace, &mut executor).await.is_err() {
                tracing::warn!(
                    call_id = %call_id,
                    grace_ms = grace.as_millis() as u64,
                    "executor ignored cancellation, aborting"
                );
                executor.abort();
            }
            if let Err(e) = runner.reclaim(&call_id).await {
                tracing::warn!(call_id = %call_id, error = %e, "reclaim failed");
            }
            pending.fetch_sub(1, Ordering::SeqCst);
        });
    }

    /// Reclaims started but not yet finished
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "reclaim_tests.rs"]
mod tests;
