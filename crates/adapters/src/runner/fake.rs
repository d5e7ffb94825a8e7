// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake function runner for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ExitInfo, FunctionRunner, Invocation, RunnerError, RunnerEvent, EVENT_BUFFER};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Recorded runner call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerCall {
    Start {
        call_id: String,
        image: String,
        env: Vec<(String, String)>,
        body: Bytes,
    },
    Reclaim {
        call_id: String,
    },
}

/// One step of a scripted function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeStep {
    Stdout(String),
    Stderr(String),
    Sleep(Duration),
    /// Write the request body to stdout
    EchoBody,
    /// Write the value of an environment variable to stdout
    EchoEnv(String),
    /// `Hello {Name}!\n` where `Name` comes from a JSON body, default `World`
    Greet,
    /// Write `n` bytes of log output in small chunks
    FloodStderr(usize),
}

/// A scripted function body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeFunction {
    steps: Vec<FakeStep>,
    exit_code: i32,
}

impl FakeFunction {
    pub fn new() -> Self {
        Self::default()
    }

    /// The classic hello function
    pub fn hello() -> Self {
        Self::new().step(FakeStep::Greet)
    }

    pub fn step(mut self, step: FakeStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn stdout(self, text: impl Into<String>) -> Self {
        self.step(FakeStep::Stdout(text.into()))
    }

    pub fn stderr(self, text: impl Into<String>) -> Self {
        self.step(FakeStep::Stderr(text.into()))
    }

    pub fn sleep(self, duration: Duration) -> Self {
        self.step(FakeStep::Sleep(duration))
    }

    pub fn exit(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }
}

#[derive(Default)]
struct FakeRunnerState {
    functions: HashMap<String, FakeFunction>,
    calls: Vec<RunnerCall>,
    live: HashMap<String, CancellationToken>,
    start_failures: Vec<String>,
}

/// Fake runner that plays [`FakeFunction`] scripts keyed by image
#[derive(Clone, Default)]
pub struct FakeFunctionRunner {
    state: Arc<Mutex<FakeRunnerState>>,
}

impl FakeFunctionRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the script played for `image`
    pub fn register(&self, image: impl Into<String>, function: FakeFunction) -> &Self {
        self.lock().functions.insert(image.into(), function);
        self
    }

    /// Make `start` fail for `image`
    pub fn fail_start(&self, image: impl Into<String>) {
        self.lock().start_failures.push(image.into());
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<RunnerCall> {
        self.lock().calls.clone()
    }

    /// Calls reclaimed so far
    pub fn reclaimed(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                RunnerCall::Reclaim { call_id } => Some(call_id.clone()),
                RunnerCall::Start { .. } => None,
            })
            .collect()
    }

    /// Number of scripts still playing
    pub fn live(&self) -> usize {
        self.lock().live.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeRunnerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl FunctionRunner for FakeFunctionRunner {
    async fn start(
        &self,
        invocation: Invocation,
    ) -> Result<mpsc::Receiver<RunnerEvent>, RunnerError> {
        let kill = CancellationToken::new();
        let function = {
            let mut state = self.lock();
            state.calls.push(RunnerCall::Start {
                call_id: invocation.call_id.clone(),
                image: invocation.image.clone(),
                env: invocation.env.clone(),
                body: invocation.body.clone(),
            });
            if state.start_failures.contains(&invocation.image) {
                return Err(RunnerError::StartFailed(format!(
                    "injected failure for {}",
                    invocation.image
                )));
            }
            let function = state
                .functions
                .get(&invocation.image)
                .cloned()
                .ok_or_else(|| RunnerError::ImageNotFound(invocation.image.clone()))?;
            state
                .live
                .insert(invocation.call_id.clone(), kill.clone());
            function
        };

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let finished = tokio::select! {
                finished = play(&function, &invocation, &tx) => finished,
                _ = kill.cancelled() => false,
            };
            if finished {
                let _ = tx
                    .send(RunnerEvent::Exited(ExitInfo {
                        code: function.exit_code,
                    }))
                    .await;
            }
            state
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .live
                .remove(&invocation.call_id);
        });

        Ok(rx)
    }

    async fn reclaim(&self, call_id: &str) -> Result<(), RunnerError> {
        let mut state = self.lock();
        state.calls.push(RunnerCall::Reclaim {
            call_id: call_id.to_string(),
        });
        if let Some(kill) = state.live.get(call_id) {
            kill.cancel();
        }
        Ok(())
    }
}

/// Play a script; false when the receiver went away first
async fn play(
    function: &FakeFunction,
    invocation: &Invocation,
    tx: &mpsc::Sender<RunnerEvent>,
) -> bool {
    for step in &function.steps {
        let events = match step {
            FakeStep::Stdout(text) => vec![RunnerEvent::Stdout(Bytes::from(text.clone()))],
            FakeStep::Stderr(text) => vec![RunnerEvent::Stderr(Bytes::from(text.clone()))],
            FakeStep::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                continue;
            }
            FakeStep::EchoBody => vec![RunnerEvent::Stdout(invocation.body.clone())],
            FakeStep::EchoEnv(name) => {
                let value = invocation
                    .env
                    .iter()
                    .find(|(k, _)| k == name)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default();
                vec![RunnerEvent::Stdout(Bytes::from(value))]
            }
            FakeStep::Greet => {
                let name = serde_json::from_slice::<serde_json::Value>(&invocation.body)
                    .ok()
                    .and_then(|v| v.get("Name").and_then(|n| n.as_str()).map(String::from))
                    .unwrap_or_else(|| "World".to_string());
                vec![RunnerEvent::Stdout(Bytes::from(format!("Hello {name}!\n")))]
            }
            FakeStep::FloodStderr(total) => {
                let chunk = Bytes::from(vec![b'x'; 256]);
                let mut events = Vec::new();
                let mut remaining = *total;
                while remaining > 0 {
                    let n = remaining.min(chunk.len());
                    events.push(RunnerEvent::Stderr(chunk.slice(..n)));
                    remaining -= n;
                }
                events
            }
        };
        for event in events {
            if tx.send(event).await.is_err() {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
