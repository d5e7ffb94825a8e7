// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

use crate::{CallStore, Journal, LogStore};
use fx_core::{CallStatus, Operation};
use std::sync::Arc;

/// Call and log stores rebuilt from journal operations.
///
/// Replayed operations are applied without being journaled again; writes
/// made after replay go to the journal the state was built with.
pub struct MaterializedState {
    calls: CallStore,
    logs: LogStore,
    skipped: usize,
}

impl MaterializedState {
    pub fn new(log_max_bytes: usize, journal: Arc<dyn Journal>) -> Self {
        Self {
            calls: CallStore::with_journal(Arc::clone(&journal)),
            logs: LogStore::with_journal(log_max_bytes, journal),
            skipped: 0,
        }
    }

    /// Build state by applying `ops` in order
    pub fn replay(
        ops: impl IntoIterator<Item = Operation>,
        log_max_bytes: usize,
        journal: Arc<dyn Journal>,
    ) -> Self {
        let mut state = Self::new(log_max_bytes, journal);
        for op in ops {
            state.apply(&op);
        }
        state
    }

    /// Apply an operation to update the state
    pub fn apply(&mut self, op: &Operation) {
        let applied = match op {
            Operation::CallCreate { call } => {
                self.calls.restore(call.clone());
                true
            }
            Operation::CallTransition { id, from, to, at } => self
                .calls
                .restore_transition(id, *from, *to, *at)
                .is_ok(),
            Operation::LogPersist { id, log, truncated } => {
                self.logs.restore(id, log, *truncated);
                true
            }
        };
        if !applied {
            tracing::warn!(call_id = op.call_id(), "skipping inapplicable WAL operation");
            self.skipped += 1;
        }
    }

    /// The shortest operation list that rebuilds this state.
    ///
    /// One `CallCreate` per call carrying its current record, oldest first,
    /// then one `LogPersist` per sealed log.
    pub fn checkpoint(&self) -> Vec<Operation> {
        let mut calls = self.calls.snapshot();
        calls.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        let mut ops: Vec<Operation> = calls
            .into_iter()
            .map(|call| Operation::CallCreate { call })
            .collect();
        ops.extend(self.logs.persisted());
        ops
    }

    /// Calls that were running when the journal ended
    pub fn interrupted(&self) -> Vec<String> {
        self.calls.ids_with_status(CallStatus::Running)
    }

    /// Calls that were accepted but never started
    pub fn pending(&self) -> Vec<String> {
        self.calls.ids_with_status(CallStatus::Queued)
    }

    /// Operations that could not be applied during replay
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn calls(&self) -> &CallStore {
        &self.calls
    }

    pub fn logs(&self) -> &LogStore {
        &self.logs
    }

    pub fn into_stores(self) -> (CallStore, LogStore) {
        (self.calls, self.logs)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
