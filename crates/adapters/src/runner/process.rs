// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local process runner: `sh -c <image>`

use super::{ExitInfo, FunctionRunner, Invocation, RunnerError, RunnerEvent, EVENT_BUFFER};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const READ_CHUNK: usize = 8 * 1024;

/// Variables passed through from the daemon's own environment
const INHERITED_ENV: &[&str] = &["PATH", "HOME", "LANG", "TMPDIR"];

/// Runs each function as a child process of the daemon
#[derive(Clone, Default)]
pub struct ProcessRunner {
    shell: Option<String>,
    /// Kill switches for live processes, keyed by call ID
    running: Arc<Mutex<HashMap<String, CancellationToken>>>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a shell other than `sh`
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    /// Number of processes still alive
    pub fn running(&self) -> usize {
        self.running.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl FunctionRunner for ProcessRunner {
    async fn start(
        &self,
        invocation: Invocation,
    ) -> Result<mpsc::Receiver<RunnerEvent>, RunnerError> {
        let shell = self.shell.as_deref().unwrap_or("sh");
        let mut cmd = Command::new(shell);
        cmd.arg("-c")
            .arg(&invocation.image)
            .env_clear()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for key in INHERITED_ENV {
            if let Ok(value) = std::env::var(key) {
                cmd.env(key, value);
            }
        }
        cmd.envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let mut child = cmd
            .spawn()
            .map_err(|e| RunnerError::StartFailed(e.to_string()))?;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        if let Some(mut stdin) = child.stdin.take() {
            let body = invocation.body.clone();
            tokio::spawn(async move {
                // The function may exit without reading its input
                let _ = stdin.write_all(&body).await;
                let _ = stdin.shutdown().await;
            });
        }

        let stdout = child
            .stdout
            .take()
            .map(|out| tokio::spawn(forward(out, tx.clone(), RunnerEvent::Stdout)));
        let stderr = child
            .stderr
            .take()
            .map(|err| tokio::spawn(forward(err, tx.clone(), RunnerEvent::Stderr)));

        let kill = CancellationToken::new();
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(invocation.call_id.clone(), kill.clone());

        let running = Arc::clone(&self.running);
        let call_id = invocation.call_id;
        tokio::spawn(async move {
            let status = tokio::select! {
                status = child.wait() => status,
                _ = kill.cancelled() => {
                    if let Err(e) = child.kill().await {
                        tracing::warn!(call_id, error = %e, "kill failed");
                    }
                    child.wait().await
                }
            };

            if kill.is_cancelled() {
                // Reclaimed runs have no reader left; don't wait on orphaned pipes
                for reader in [stdout, stderr].into_iter().flatten() {
                    reader.abort();
                }
            } else {
                for reader in [stdout, stderr].into_iter().flatten() {
                    let _ = reader.await;
                }
            }

            let code = match status {
                Ok(status) => status.code().unwrap_or(-1),
                Err(e) => {
                    tracing::warn!(call_id, error = %e, "wait failed");
                    -1
                }
            };
            let _ = tx.send(RunnerEvent::Exited(ExitInfo { code })).await;
            running
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&call_id);
        });

        Ok(rx)
    }

    async fn reclaim(&self, call_id: &str) -> Result<(), RunnerError> {
        let kill = self
            .running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(call_id)
            .cloned();
        if let Some(kill) = kill {
            kill.cancel();
        }
        Ok(())
    }
}

/// Copy a pipe into the event channel until EOF or the receiver goes away
async fn forward<R>(mut pipe: R, tx: mpsc::Sender<RunnerEvent>, wrap: fn(Bytes) -> RunnerEvent)
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(READ_CHUNK);
    loop {
        buf.reserve(READ_CHUNK);
        match pipe.read_buf(&mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if tx.send(wrap(buf.split().freeze())).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "pipe read failed");
                break;
            }
        }
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
