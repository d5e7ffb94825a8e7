// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource limits for the call engine.
//!
//! These bound how much work the engine accepts and retains:
//! - concurrent asynchronous workers
//! - pending asynchronous calls
//! - captured log bytes per call
//! - response body bytes kept from a synchronous function
//! - how long a timed-out function may take to stop

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Resource limits for the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineLimits {
    /// Workers draining the async queue
    pub workers: usize,
    /// Async calls that may wait in the queue
    pub queue_capacity: usize,
    /// Maximum captured log bytes per call
    pub log_max_bytes: usize,
    /// Stdout kept as a synchronous call's response body; the rest is dropped
    pub body_max_bytes: usize,
    /// Time a cancelled function gets to stop before it is abandoned
    #[serde(with = "humantime_serde")]
    pub cancel_grace: Duration,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
            log_max_bytes: 1024 * 1024, // 1MiB
            body_max_bytes: 6 * 1024 * 1024,
            cancel_grace: Duration::from_secs(2),
        }
    }
}

impl EngineLimits {
    /// Create limits suitable for testing (lower values).
    pub fn for_testing() -> Self {
        Self {
            workers: 2,
            queue_capacity: 8,
            log_max_bytes: 1024,
            body_max_bytes: 1024,
            cancel_grace: Duration::from_millis(100),
        }
    }

    /// Clamp values that would leave the engine unable to make progress.
    pub fn normalized(mut self) -> Self {
        self.workers = self.workers.max(1);
        self.queue_capacity = self.queue_capacity.max(1);
        self
    }
}
