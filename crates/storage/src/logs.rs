// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded per-call logs
//!
//! Each call gets its own [`LogBuffer`] with its own lock, so a noisy
//! function never stalls appends or reads for another call.

use crate::{Journal, NoopJournal, StoreError};
use fx_core::Operation;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Append-only byte sink capped at `max_bytes`
#[derive(Debug)]
pub struct LogBuffer {
    max_bytes: usize,
    inner: Mutex<LogInner>,
}

#[derive(Debug, Default)]
struct LogInner {
    bytes: Vec<u8>,
    truncated: bool,
    sealed: bool,
}

impl LogBuffer {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            inner: Mutex::new(LogInner::default()),
        }
    }

    /// Append as much of `data` as fits under the cap.
    ///
    /// Returns the number of bytes kept. Bytes past the cap, and any write
    /// after [`seal`](Self::seal), are dropped.
    pub fn append(&self, data: &[u8]) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.sealed {
            return 0;
        }
        let room = self.max_bytes.saturating_sub(inner.bytes.len());
        let kept = room.min(data.len());
        inner.bytes.extend_from_slice(&data[..kept]);
        if kept < data.len() {
            inner.truncated = true;
        }
        kept
    }

    /// Stop accepting writes
    pub fn seal(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).sealed = true;
    }

    /// Captured text, never longer than the cap.
    ///
    /// Invalid UTF-8 is replaced, and the result is cut back to a char
    /// boundary if replacement grew it past the cap.
    pub fn read(&self) -> String {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut text = String::from_utf8_lossy(&inner.bytes).into_owned();
        if text.len() > self.max_bytes {
            let mut end = self.max_bytes;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            text.truncate(end);
        }
        text
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any bytes were dropped at the cap
    pub fn is_truncated(&self) -> bool {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).truncated
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).sealed
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}

/// Log buffers keyed by call ID
pub struct LogStore {
    max_bytes: usize,
    logs: RwLock<HashMap<String, Arc<LogBuffer>>>,
    journal: Arc<dyn Journal>,
}

impl LogStore {
    /// In-memory store that journals nothing
    pub fn new(max_bytes: usize) -> Self {
        Self::with_journal(max_bytes, Arc::new(NoopJournal))
    }

    pub fn with_journal(max_bytes: usize, journal: Arc<dyn Journal>) -> Self {
        Self {
            max_bytes,
            logs: RwLock::new(HashMap::new()),
            journal,
        }
    }

    /// Buffer for `id`, created empty on first use
    pub fn open(&self, id: &str) -> Arc<LogBuffer> {
        if let Some(buffer) = self.get(id) {
            return buffer;
        }
        let mut logs = self.logs.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            logs.entry(id.to_string())
                .or_insert_with(|| Arc::new(LogBuffer::new(self.max_bytes))),
        )
    }

    pub fn get(&self, id: &str) -> Option<Arc<LogBuffer>> {
        self.logs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    /// Append to an open buffer; no-op past the cap
    pub fn append(&self, id: &str, data: &[u8]) -> Result<usize, StoreError> {
        let buffer = self
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(buffer.append(data))
    }

    pub fn read(&self, id: &str) -> Result<String, StoreError> {
        self.get(id)
            .map(|buffer| buffer.read())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Seal the buffer and journal its final contents
    pub fn seal(&self, id: &str) -> Result<(), StoreError> {
        let buffer = self
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        buffer.seal();
        self.journal.record(&Operation::LogPersist {
            id: id.to_string(),
            log: buffer.read(),
            truncated: buffer.is_truncated(),
        })?;
        Ok(())
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Sealed logs as journal records, ordered by call ID
    pub(crate) fn persisted(&self) -> Vec<Operation> {
        let mut ops: Vec<Operation> = self
            .logs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(_, buffer)| buffer.is_sealed())
            .map(|(id, buffer)| Operation::LogPersist {
                id: id.clone(),
                log: buffer.read(),
                truncated: buffer.is_truncated(),
            })
            .collect();
        ops.sort_by(|a, b| a.call_id().cmp(b.call_id()));
        ops
    }

    /// Put a replayed, sealed log in place without journaling it
    pub(crate) fn restore(&self, id: &str, log: &str, truncated: bool) {
        let buffer = LogBuffer::new(self.max_bytes);
        buffer.append(log.as_bytes());
        if truncated {
            buffer.inner.lock().unwrap_or_else(|e| e.into_inner()).truncated = true;
        }
        buffer.seal();
        let mut logs = self.logs.write().unwrap_or_else(|e| e.into_inner());
        logs.insert(id.to_string(), Arc::new(buffer));
    }
}

#[cfg(test)]
#[path = "logs_tests.rs"]
mod tests;
