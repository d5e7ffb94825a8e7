// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wiring of dispatcher, workers and queries

use crate::{CallQuery, Dispatcher, WorkerPool};
use fx_adapters::{FunctionRunner, RouteRegistry};
use fx_core::{Clock, EngineLimits, IdGen};
use fx_storage::{CallStore, LogStore};
use std::sync::Arc;

/// Runtime adapter dependencies
pub struct RuntimeDeps<R, F, C, I> {
    pub registry: R,
    pub runner: F,
    pub clock: C,
    pub ids: I,
    pub calls: Arc<CallStore>,
    pub logs: Arc<LogStore>,
}

/// A running engine: dispatcher, worker pool and query surface
pub struct Runtime<R, F, C, I> {
    dispatcher: Dispatcher<R, F, C, I>,
    query: CallQuery,
    pool: WorkerPool,
}

impl<R, F, C, I> Runtime<R, F, C, I>
where
    R: RouteRegistry,
    F: FunctionRunner,
    C: Clock,
    I: IdGen,
{
    /// Build the engine and spawn its workers. Must run inside a tokio runtime.
    pub fn start(deps: RuntimeDeps<R, F, C, I>, limits: EngineLimits) -> Self {
        let limits = limits.normalized();
        let query = CallQuery::new(Arc::clone(&deps.calls), Arc::clone(&deps.logs));
        let (dispatcher, receiver) = Dispatcher::new(deps, &limits);
        let pool = WorkerPool::spawn(dispatcher.clone(), receiver, limits.workers);
        tracing::info!(
            workers = limits.workers,
            queue_capacity = limits.queue_capacity,
            log_max_bytes = limits.log_max_bytes,
            "engine started"
        );
        Self {
            dispatcher,
            query,
            pool,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<R, F, C, I> {
        &self.dispatcher
    }

    pub fn query(&self) -> &CallQuery {
        &self.query
    }

    pub fn workers(&self) -> usize {
        self.pool.workers()
    }

    /// Calls accepted but not yet picked up
    pub fn queued(&self) -> usize {
        self.dispatcher.queue().len()
    }

    /// Stop the workers after their in-flight calls finish
    pub async fn shutdown(self) {
        let queued = self.queued();
        self.pool.shutdown().await;
        tracing::info!(queued, "engine stopped");
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
