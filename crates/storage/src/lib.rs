// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Call record and log storage for the function call engine

mod calls;
mod error;
mod journal;
mod logs;
mod state;
mod wal;

pub use calls::CallStore;
pub use error::StoreError;
pub use journal::{Journal, NoopJournal, WalJournal};
pub use logs::{LogBuffer, LogStore};
pub use state::MaterializedState;
pub use wal::{Wal, WalError};
