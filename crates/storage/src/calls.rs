// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Call record store
//!
//! Records live behind their own mutex; the map lock is only held long
//! enough to find or insert a record and never across a journal write.
//! Transitions are compare-and-set on the status, so two writers racing on
//! one call cannot both succeed.

use crate::{Journal, NoopJournal, StoreError};
use chrono::{DateTime, Utc};
use fx_core::{Call, CallStatus, Operation};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

type Record = Arc<Mutex<Call>>;

/// Thread-safe store of call records keyed by call ID
pub struct CallStore {
    records: RwLock<HashMap<String, Record>>,
    /// IDs whose creation is being journaled
    creating: Mutex<HashSet<String>>,
    journal: Arc<dyn Journal>,
}

impl Default for CallStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CallStore {
    /// In-memory store that journals nothing
    pub fn new() -> Self {
        Self::with_journal(Arc::new(NoopJournal))
    }

    pub fn with_journal(journal: Arc<dyn Journal>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            creating: Mutex::new(HashSet::new()),
            journal,
        }
    }

    /// Insert a new record. The ID must not already exist.
    ///
    /// The record becomes visible only once its creation is journaled.
    pub fn create(&self, call: Call) -> Result<(), StoreError> {
        {
            let mut creating = self.creating.lock().unwrap_or_else(|e| e.into_inner());
            let exists = self
                .records
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .contains_key(&call.id);
            if exists || !creating.insert(call.id.clone()) {
                return Err(StoreError::AlreadyExists(call.id));
            }
        }

        let journaled = self.journal.record(&Operation::CallCreate { call: call.clone() });
        if journaled.is_ok() {
            self.records
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .insert(call.id.clone(), Arc::new(Mutex::new(call.clone())));
        }
        self.creating
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&call.id);
        Ok(journaled?)
    }

    /// Move a call from `from` to `to` if it is still in `from`.
    ///
    /// Returns the record as committed.
    pub fn transition(
        &self,
        id: &str,
        from: CallStatus,
        to: CallStatus,
        at: DateTime<Utc>,
    ) -> Result<Call, StoreError> {
        let record = self.record(id)?;
        let mut call = record.lock().unwrap_or_else(|e| e.into_inner());

        // Validate on a copy so a journal failure leaves the record untouched
        let mut next = call.clone();
        next.transition(from, to, at)?;
        self.journal.record(&Operation::CallTransition {
            id: id.to_string(),
            from,
            to,
            at,
        })?;
        *call = next;
        Ok(call.clone())
    }

    /// Snapshot of a call record
    pub fn get(&self, id: &str) -> Result<Call, StoreError> {
        let record = self.record(id)?;
        let call = record.lock().unwrap_or_else(|e| e.into_inner());
        Ok(call.clone())
    }

    /// Snapshot of a call that must belong to `app`
    pub fn get_in_app(&self, app: &str, id: &str) -> Result<Call, StoreError> {
        let call = self.get(id)?;
        if call.app != app {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(call)
    }

    /// Calls of an app, newest first, optionally limited to one route path
    pub fn list(&self, app: &str, path: Option<&str>) -> Vec<Call> {
        let mut calls: Vec<Call> = self
            .snapshot()
            .into_iter()
            .filter(|c| c.app == app)
            .filter(|c| path.is_none_or(|p| c.path == p))
            .collect();
        calls.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        calls
    }

    /// IDs of every call currently in `status`
    pub fn ids_with_status(&self, status: CallStatus) -> Vec<String> {
        let mut ids: Vec<String> = self
            .snapshot()
            .into_iter()
            .filter(|c| c.status == status)
            .map(|c| c.id)
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Put a replayed record in place without journaling it
    pub(crate) fn restore(&self, call: Call) {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.insert(call.id.clone(), Arc::new(Mutex::new(call)));
    }

    /// Apply a replayed transition without journaling it
    pub(crate) fn restore_transition(
        &self,
        id: &str,
        from: CallStatus,
        to: CallStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let record = self.record(id)?;
        let mut call = record.lock().unwrap_or_else(|e| e.into_inner());
        call.transition(from, to, at)?;
        Ok(())
    }

    fn record(&self, id: &str) -> Result<Record, StoreError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub(crate) fn snapshot(&self) -> Vec<Call> {
        let records: Vec<Record> = self
            .records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        records
            .iter()
            .map(|r| r.lock().unwrap_or_else(|e| e.into_inner()).clone())
            .collect()
    }
}

#[cfg(test)]
#[path = "calls_tests.rs"]
mod tests;
