// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs one call's function and streams its output

use crate::CallRequest;
use bytes::{Bytes, BytesMut};
use fx_adapters::{ExitInfo, FunctionRunner, Invocation, RunnerEvent};
use fx_core::{Call, ExecutionMode, Route};
use fx_storage::LogBuffer;
use tokio_util::sync::CancellationToken;

/// How a run ended, as seen by the executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success {
        body: Bytes,
        exit: ExitInfo,
    },
    Error {
        body: Bytes,
        exit: Option<ExitInfo>,
        message: String,
    },
    /// Cancellation was observed before the function finished
    Cancelled,
}

/// Runs functions through a [`FunctionRunner`].
///
/// The executor never touches the call record. Stderr goes to the call's
/// log as it arrives. Stdout of a sync call is kept as the response body up
/// to `body_max` bytes; stdout of an async call has no reader and is dropped.
#[derive(Clone)]
pub struct Executor<F> {
    runner: F,
    body_max: usize,
}

impl<F: FunctionRunner> Executor<F> {
    pub fn new(runner: F, body_max: usize) -> Self {
        Self { runner, body_max }
    }

    pub fn runner(&self) -> &F {
        &self.runner
    }

    /// Run `invocation` until it exits or `cancel` fires
    pub async fn run(
        &self,
        invocation: Invocation,
        log: &LogBuffer,
        cancel: CancellationToken,
    ) -> Outcome {
        if cancel.is_cancelled() {
            return Outcome::Cancelled;
        }

        let call_id = invocation.call_id.clone();
        let body_max = match invocation.mode {
            ExecutionMode::Sync => self.body_max,
            ExecutionMode::Async => 0,
        };
        let start = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Outcome::Cancelled,
            start = self.runner.start(invocation) => start,
        };
        let mut events = match start {
            Ok(events) => events,
            Err(e) => {
                let message = e.to_string();
                log.append(format!("{message}\n").as_bytes());
                return Outcome::Error {
                    body: Bytes::new(),
                    exit: None,
                    message,
                };
            }
        };

        let mut body = BytesMut::new();
        let mut dropped = 0usize;
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Outcome::Cancelled,
                event = events.recv() => event,
            };
            match event {
                Some(RunnerEvent::Stdout(chunk)) => {
                    let room = body_max.saturating_sub(body.len());
                    let keep = chunk.len().min(room);
                    body.extend_from_slice(&chunk[..keep]);
                    if keep < chunk.len() && body_max > 0 && dropped == 0 {
                        tracing::warn!(
                            call_id = %call_id,
                            body_max,
                            "response body over limit, dropping the rest"
                        );
                    }
                    dropped += chunk.len() - keep;
                }
                Some(RunnerEvent::Stderr(chunk)) => {
                    log.append(&chunk);
                }
                Some(RunnerEvent::Exited(exit)) if exit.success() => {
                    return Outcome::Success {
                        body: body.freeze(),
                        exit,
                    }
                }
                Some(RunnerEvent::Exited(exit)) => {
                    return Outcome::Error {
                        body: body.freeze(),
                        exit: Some(exit),
                        message: format!("function exited with code {}", exit.code),
                    }
                }
                None => {
                    return Outcome::Error {
                        body: body.freeze(),
                        exit: None,
                        message: "function output ended without an exit status".to_string(),
                    }
                }
            }
        }
    }
}

/// Build what the runner needs to start `call`.
///
/// Environment order: route config, `FN_*` call metadata, then one
/// `HEADER_<NAME>` per distinct request header with repeats folded.
pub fn invocation(call: &Call, route: &Route, request: CallRequest) -> Invocation {
    let mut env: Vec<(String, String)> = route
        .config
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    env.extend([
        ("FN_APP_NAME".to_string(), call.app.clone()),
        ("FN_PATH".to_string(), call.path.clone()),
        ("FN_METHOD".to_string(), request.method),
        ("FN_REQUEST_URL".to_string(), request.url),
        ("FN_CALL_ID".to_string(), call.id.clone()),
        ("FN_MEMORY".to_string(), route.memory.to_string()),
        ("FN_TYPE".to_string(), call.mode.to_string()),
    ]);
    env.extend(call.headers.to_env());

    Invocation {
        call_id: call.id.clone(),
        app: call.app.clone(),
        path: call.path.clone(),
        image: route.image.clone(),
        mode: call.mode,
        env,
        body: request.body,
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
