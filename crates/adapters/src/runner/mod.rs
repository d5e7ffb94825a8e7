// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Function runner adapters
//!
//! A runner decides how a function body executes. The engine only sees a
//! stream of [`RunnerEvent`]s ending in [`RunnerEvent::Exited`], and asks
//! the runner to reclaim whatever backed a run once it is abandoned.

mod process;

pub use process::ProcessRunner;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeFunction, FakeFunctionRunner, FakeStep, RunnerCall};

use async_trait::async_trait;
use bytes::Bytes;
use fx_core::ExecutionMode;
use thiserror::Error;
use tokio::sync::mpsc;

/// Buffered runner events per call before the runner waits on the executor
pub const EVENT_BUFFER: usize = 64;

/// Everything a runner needs to start one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub call_id: String,
    pub app: String,
    pub path: String,
    pub image: String,
    pub mode: ExecutionMode,
    /// Environment handed to the function, in order
    pub env: Vec<(String, String)>,
    /// Request body, delivered on stdin
    pub body: Bytes,
}

/// How a function run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitInfo {
    /// Process-style exit code; negative when killed by a signal
    pub code: i32,
}

impl ExitInfo {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Output streamed from a running function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerEvent {
    /// Response body bytes
    Stdout(Bytes),
    /// Log bytes
    Stderr(Bytes),
    /// Final event of every run
    Exited(ExitInfo),
}

/// Errors from function runners
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("image not found: {0}")]
    ImageNotFound(String),
    #[error("failed to start function: {0}")]
    StartFailed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Adapter that executes function bodies
#[async_trait]
pub trait FunctionRunner: Clone + Send + Sync + 'static {
    /// Start a function. Output arrives on the returned channel as it is
    /// produced; the channel ends after [`RunnerEvent::Exited`].
    ///
    /// Dropping the receiver tells the runner to stop forwarding output.
    async fn start(
        &self,
        invocation: Invocation,
    ) -> Result<mpsc::Receiver<RunnerEvent>, RunnerError>;

    /// Release the resources behind a run. Safe to call for finished or
    /// unknown calls.
    async fn reclaim(&self, call_id: &str) -> Result<(), RunnerError>;
}
