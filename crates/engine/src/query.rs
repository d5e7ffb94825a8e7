// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only view over call records and logs

use crate::QueryError;
use fx_core::Call;
use fx_storage::{CallStore, LogStore};
use serde::Serialize;
use std::sync::Arc;

/// Captured log of one call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallLog {
    pub call_id: String,
    pub log: String,
}

/// Status and log lookups. Never mutates either store.
#[derive(Clone)]
pub struct CallQuery {
    calls: Arc<CallStore>,
    logs: Arc<LogStore>,
}

impl CallQuery {
    pub fn new(calls: Arc<CallStore>, logs: Arc<LogStore>) -> Self {
        Self { calls, logs }
    }

    pub fn get_status(&self, id: &str) -> Result<Call, QueryError> {
        Ok(self.calls.get(id)?)
    }

    /// Like [`get_status`](Self::get_status), but a call from another app is not found
    pub fn get_status_in(&self, app: &str, id: &str) -> Result<Call, QueryError> {
        Ok(self.calls.get_in_app(app, id)?)
    }

    /// Log of a known call; empty until the call starts running
    pub fn get_log(&self, id: &str) -> Result<CallLog, QueryError> {
        let call = self.calls.get(id)?;
        Ok(self.log_of(call))
    }

    pub fn get_log_in(&self, app: &str, id: &str) -> Result<CallLog, QueryError> {
        let call = self.calls.get_in_app(app, id)?;
        Ok(self.log_of(call))
    }

    /// Calls of `app`, newest first
    pub fn list_calls(&self, app: &str, path: Option<&str>) -> Vec<Call> {
        self.calls.list(app, path)
    }

    fn log_of(&self, call: Call) -> CallLog {
        let log = self
            .logs
            .get(&call.id)
            .map(|buffer| buffer.read())
            .unwrap_or_default();
        CallLog {
            call_id: call.id,
            log,
        }
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
