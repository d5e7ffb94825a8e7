// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations for the write-ahead log

use crate::call::{Call, CallStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operations that can be persisted to the WAL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// A call record was created in the `queued` status, or carried over
    /// as-is by a checkpoint
    CallCreate { call: Call },

    /// A call moved between statuses
    CallTransition {
        id: String,
        from: CallStatus,
        to: CallStatus,
        at: DateTime<Utc>,
    },

    /// A call's log was sealed after it reached a terminal status
    LogPersist {
        id: String,
        log: String,
        #[serde(default)]
        truncated: bool,
    },
}

impl Operation {
    /// ID of the call this operation touches
    pub fn call_id(&self) -> &str {
        match self {
            Operation::CallCreate { call } => &call.id,
            Operation::CallTransition { id, .. } | Operation::LogPersist { id, .. } => id,
        }
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
