// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded FIFO of async calls and the workers that drain it

use crate::{CallRequest, Dispatcher, DispatchError};
use fx_adapters::{FunctionRunner, RouteRegistry};
use fx_core::{Clock, IdGen, Route};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// An accepted async call waiting for a worker
#[derive(Debug, Clone)]
pub struct QueuedCall {
    pub call_id: String,
    /// Route as resolved at submit time
    pub route: Route,
    pub request: CallRequest,
}

/// Submitting side of the call queue
#[derive(Clone)]
pub struct CallQueue {
    tx: mpsc::Sender<QueuedCall>,
}

/// Draining side of the call queue, handed to a [`WorkerPool`]
pub struct QueueReceiver {
    rx: mpsc::Receiver<QueuedCall>,
}

/// A reserved queue slot. Sending through it cannot fail.
pub struct QueueSlot<'a> {
    permit: mpsc::Permit<'a, QueuedCall>,
}

impl QueueReceiver {
    /// Next queued call in arrival order; `None` once every sender is gone
    pub async fn recv(&mut self) -> Option<QueuedCall> {
        self.rx.recv().await
    }
}

impl QueueSlot<'_> {
    pub fn send(self, call: QueuedCall) {
        self.permit.send(call);
    }
}

impl CallQueue {
    pub fn bounded(capacity: usize) -> (Self, QueueReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, QueueReceiver { rx })
    }

    /// Reserve a slot without waiting.
    ///
    /// Fails with [`DispatchError::QueueFull`] at capacity.
    pub fn reserve(&self) -> Result<QueueSlot<'_>, DispatchError> {
        match self.tx.try_reserve() {
            Ok(permit) => Ok(QueueSlot { permit }),
            Err(mpsc::error::TrySendError::Full(())) => Err(DispatchError::QueueFull {
                capacity: self.capacity(),
            }),
            Err(mpsc::error::TrySendError::Closed(())) => Err(DispatchError::ShuttingDown),
        }
    }

    /// Calls waiting for a worker
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

/// Fixed set of workers pulling calls in arrival order
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl WorkerPool {
    /// Spawn `workers` tasks that hand each queued call to `dispatcher`
    pub fn spawn<R, F, C, I>(
        dispatcher: Dispatcher<R, F, C, I>,
        receiver: QueueReceiver,
        workers: usize,
    ) -> Self
    where
        R: RouteRegistry,
        F: FunctionRunner,
        C: Clock,
        I: IdGen,
    {
        let shutdown = CancellationToken::new();
        let rx = Arc::new(Mutex::new(receiver.rx));
        let handles = (0..workers.max(1))
            .map(|worker| {
                let dispatcher = dispatcher.clone();
                let rx = Arc::clone(&rx);
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    tracing::debug!(worker, "worker started");
                    while let Some(queued) = next_call(&rx, &shutdown).await {
                        dispatcher.run_queued(queued).await;
                    }
                    tracing::debug!(worker, "worker stopped");
                })
            })
            .collect();

        Self { handles, shutdown }
    }

    pub fn workers(&self) -> usize {
        self.handles.len()
    }

    /// Stop taking new calls and wait for in-flight ones.
    ///
    /// Calls still in the queue keep their `queued` status.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "worker task failed");
            }
        }
    }
}

async fn next_call(
    rx: &Mutex<mpsc::Receiver<QueuedCall>>,
    shutdown: &CancellationToken,
) -> Option<QueuedCall> {
    let mut rx = tokio::select! {
        biased;
        _ = shutdown.cancelled() => return None,
        rx = rx.lock() => rx,
    };
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => None,
        queued = rx.recv() => queued,
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
