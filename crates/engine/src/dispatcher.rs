// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Call dispatch
//!
//! The dispatcher is the only writer of call status. Sync calls run on a
//! task the submitter awaits; async calls are queued and run by the worker pool
//! through [`Dispatcher::run_queued`]. Both paths share the same running
//! state handling: deadline, cancellation, log sealing and commit.

use crate::executor::{self, Executor, Outcome};
use crate::queue::{CallQueue, QueueReceiver, QueuedCall};
use crate::{CallRequest, CallResult, DispatchError, Reclaimer, RuntimeDeps, Submission};
use bytes::Bytes;
use fx_adapters::{FunctionRunner, RouteRegistry};
use fx_core::{Call, CallStatus, Clock, EngineLimits, ExecutionMode, IdGen, Route};
use fx_storage::{CallStore, LogStore};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Log line written when a run was cut short by a restart
pub const INTERRUPTED_MESSAGE: &str = "Interrupted by restart";

/// Accepts calls and drives each one to a terminal status
#[derive(Clone)]
pub struct Dispatcher<R, F, C, I> {
    registry: R,
    executor: Executor<F>,
    reclaimer: Reclaimer<F>,
    clock: C,
    ids: I,
    calls: Arc<CallStore>,
    logs: Arc<LogStore>,
    queue: CallQueue,
}

impl<R, F, C, I> Dispatcher<R, F, C, I>
where
    R: RouteRegistry,
    F: FunctionRunner,
    C: Clock,
    I: IdGen,
{
    /// Create a dispatcher and the queue receiver its workers drain
    pub fn new(deps: RuntimeDeps<R, F, C, I>, limits: &EngineLimits) -> (Self, QueueReceiver) {
        let (queue, receiver) = CallQueue::bounded(limits.queue_capacity);
        let dispatcher = Self {
            registry: deps.registry,
            executor: Executor::new(deps.runner.clone(), limits.body_max_bytes),
            reclaimer: Reclaimer::new(deps.runner, limits.cancel_grace),
            clock: deps.clock,
            ids: deps.ids,
            calls: deps.calls,
            logs: deps.logs,
            queue,
        };
        (dispatcher, receiver)
    }

    pub fn queue(&self) -> &CallQueue {
        &self.queue
    }

    pub fn reclaimer(&self) -> &Reclaimer<F> {
        &self.reclaimer
    }

    /// Validate and accept a call.
    ///
    /// Validation and backpressure failures create no call record.
    pub async fn submit(&self, request: CallRequest) -> Result<Submission, DispatchError> {
        let span = tracing::info_span!("call.submit", app = %request.app, path = %request.path);
        self.submit_inner(request).instrument(span).await
    }

    async fn submit_inner(&self, request: CallRequest) -> Result<Submission, DispatchError> {
        let route = match self.resolve(&request).await {
            Ok(route) => route,
            Err(e) => {
                tracing::info!(error = %e, "rejected");
                return Err(e);
            }
        };

        match route.mode {
            ExecutionMode::Sync => {
                let call = self.create(&route, &request)?;
                tracing::info!(call_id = %call.id, mode = "sync", "accepted");
                // The run owns its state: a submitter that goes away must not
                // leave the record in `running`
                let span = tracing::info_span!("call.run", call_id = %call.id);
                let dispatcher = self.clone();
                let run = tokio::spawn(
                    async move { dispatcher.run(&call.id, &route, request).await }.instrument(span),
                );
                let result = run
                    .await
                    .map_err(|e| DispatchError::TaskFailed(e.to_string()))??;
                Ok(Submission::Completed(result))
            }
            ExecutionMode::Async => {
                let slot = match self.queue.reserve() {
                    Ok(slot) => slot,
                    Err(e) => {
                        tracing::warn!(error = %e, "rejected");
                        return Err(e);
                    }
                };
                let call = self.create(&route, &request)?;
                tracing::info!(call_id = %call.id, mode = "async", "queued");
                slot.send(QueuedCall {
                    call_id: call.id.clone(),
                    route,
                    request,
                });
                Ok(Submission::Accepted { call_id: call.id })
            }
        }
    }

    /// Run a call taken off the queue. Failures stay local to the call.
    pub async fn run_queued(&self, queued: QueuedCall) {
        let span = tracing::info_span!("call.run", call_id = %queued.call_id);
        let QueuedCall {
            call_id,
            route,
            request,
        } = queued;
        if let Err(e) = self.run(&call_id, &route, request).instrument(span.clone()).await {
            tracing::error!(parent: &span, error = %e, "call failed to run");
        }
    }

    /// Commit `error` for calls that were running when the process died
    pub fn fail_interrupted(&self, ids: &[String]) -> Result<usize, DispatchError> {
        for id in ids {
            let log = self.logs.open(id);
            log.append(format!("{INTERRUPTED_MESSAGE}\n").as_bytes());
            self.logs.seal(id)?;
            self.calls
                .transition(id, CallStatus::Running, CallStatus::Error, self.clock.now())?;
            tracing::warn!(call_id = %id, "marked interrupted call as error");
        }
        Ok(ids.len())
    }

    async fn resolve(&self, request: &CallRequest) -> Result<Route, DispatchError> {
        if request.app.trim().is_empty() {
            return Err(DispatchError::InvalidRequest("app name is empty".to_string()));
        }
        let route = self
            .registry
            .resolve_route(&request.app, &request.path)
            .await?;
        if !route.enabled {
            return Err(DispatchError::RouteDisabled {
                app: route.app,
                path: route.path,
            });
        }
        Ok(route)
    }

    fn create(&self, route: &Route, request: &CallRequest) -> Result<Call, DispatchError> {
        let call = Call::new(
            self.ids.next(),
            &route.app,
            &route.path,
            route.mode,
            request.headers.clone(),
            &self.clock,
        );
        self.calls.create(call.clone())?;
        Ok(call)
    }

    /// Running-state handling shared by both modes
    async fn run(
        &self,
        call_id: &str,
        route: &Route,
        request: CallRequest,
    ) -> Result<CallResult, DispatchError> {
        let start = Instant::now();
        let log = self.logs.open(call_id);
        let call = self.calls.transition(
            call_id,
            CallStatus::Queued,
            CallStatus::Running,
            self.clock.now(),
        )?;
        let invocation = executor::invocation(&call, route, request);

        let cancel = CancellationToken::new();
        let mut handle = tokio::spawn({
            let executor = self.executor.clone();
            let log = Arc::clone(&log);
            let cancel = cancel.clone();
            async move { executor.run(invocation, &log, cancel).await }
        });

        let (status, body, message) = match tokio::time::timeout(route.timeout(), &mut handle).await
        {
            Ok(Ok(Outcome::Success { body, .. })) => (CallStatus::Success, body, None),
            Ok(Ok(Outcome::Error { body, message, .. })) => {
                (CallStatus::Error, body, Some(message))
            }
            Ok(Ok(Outcome::Cancelled)) => (
                CallStatus::Error,
                Bytes::new(),
                Some("function was cancelled".to_string()),
            ),
            Ok(Err(e)) => (
                CallStatus::Error,
                Bytes::new(),
                Some(format!("executor failed: {e}")),
            ),
            Err(_) => {
                cancel.cancel();
                let message = format!("Timed out after {}s", route.timeout);
                log.append(format!("{message}\n").as_bytes());
                self.reclaimer.reclaim(call_id.to_string(), handle);
                (CallStatus::Timeout, Bytes::new(), Some(message))
            }
        };

        self.logs.seal(call_id)?;
        let call = self
            .calls
            .transition(call_id, CallStatus::Running, status, self.clock.now())?;

        match &message {
            Some(message) if status != CallStatus::Success => tracing::warn!(
                status = %status,
                elapsed_ms = start.elapsed().as_millis() as u64,
                error = %message,
                "call finished"
            ),
            _ => tracing::info!(
                status = %status,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "call finished"
            ),
        }

        Ok(CallResult {
            call,
            body,
            message,
            headers: route.headers.clone(),
        })
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
