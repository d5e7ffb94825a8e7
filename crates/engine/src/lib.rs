// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Function call execution engine

mod dispatcher;
mod error;
mod executor;
mod query;
mod queue;
mod reclaim;
mod request;
mod runtime;

pub use dispatcher::{Dispatcher, INTERRUPTED_MESSAGE};
pub use error::{DispatchError, QueryError};
pub use executor::{invocation, Executor, Outcome};
pub use query::{CallLog, CallQuery};
pub use queue::{CallQueue, QueueReceiver, QueueSlot, QueuedCall, WorkerPool};
pub use reclaim::Reclaimer;
pub use request::{CallRequest, CallResult, Submission};
pub use runtime::{Runtime, RuntimeDeps};
