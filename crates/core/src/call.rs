// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Call records and the call status state machine
//!
//! A call moves `queued -> running -> {success | error | timeout}`.
//! The only shortcut is `queued -> error`, used when a call is rejected
//! before it ever reaches an executor. Terminal statuses never change.

use crate::clock::Clock;
use crate::headers::Headers;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// How a call is delivered to its caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Caller blocks until the call reaches a terminal status
    #[default]
    Sync,
    /// Caller receives a call ID; the outcome is read later
    Async,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Sync => "sync",
            ExecutionMode::Async => "async",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Queued,
    Running,
    Success,
    Error,
    Timeout,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Queued => "queued",
            CallStatus::Running => "running",
            CallStatus::Success => "success",
            CallStatus::Error => "error",
            CallStatus::Timeout => "timeout",
        }
    }

    /// Terminal statuses accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallStatus::Success | CallStatus::Error | CallStatus::Timeout
        )
    }

    /// Whether `self -> next` is an edge of the state machine
    pub fn can_transition_to(&self, next: CallStatus) -> bool {
        use CallStatus::*;
        matches!(
            (self, next),
            (Queued, Running) | (Queued, Error) | (Running, Success | Error | Timeout)
        )
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from call status transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("call {id}: expected status {expected}, found {actual}")]
    StatusMismatch {
        id: String,
        expected: CallStatus,
        actual: CallStatus,
    },
    #[error("call {id}: illegal transition {from} -> {to}")]
    IllegalTransition {
        id: String,
        from: CallStatus,
        to: CallStatus,
    },
}

/// One invocation of a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub id: String,
    pub app: String,
    pub path: String,
    pub mode: ExecutionMode,
    pub status: CallStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Request headers in arrival order, repeats preserved
    #[serde(default)]
    pub headers: Headers,
}

impl Call {
    /// Create a new call in the `queued` status
    pub fn new(
        id: impl Into<String>,
        app: impl Into<String>,
        path: impl Into<String>,
        mode: ExecutionMode,
        headers: Headers,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: id.into(),
            app: app.into(),
            path: path.into(),
            mode,
            status: CallStatus::Queued,
            created_at: clock.now(),
            started_at: None,
            completed_at: None,
            headers,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move from `from` to `to`, stamping the time of the change.
    ///
    /// Fails if the current status is not `from` (another writer got there
    /// first) or if the edge is not part of the state machine.
    pub fn transition(
        &mut self,
        from: CallStatus,
        to: CallStatus,
        at: DateTime<Utc>,
    ) -> Result<(), CallError> {
        if self.status != from {
            return Err(CallError::StatusMismatch {
                id: self.id.clone(),
                expected: from,
                actual: self.status,
            });
        }
        if !from.can_transition_to(to) {
            return Err(CallError::IllegalTransition {
                id: self.id.clone(),
                from,
                to,
            });
        }

        self.status = to;
        if to == CallStatus::Running {
            self.started_at.get_or_insert(at);
        }
        if to.is_terminal() {
            self.completed_at.get_or_insert(at);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "call_tests.rs"]
mod tests;
