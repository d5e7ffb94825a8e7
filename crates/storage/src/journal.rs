// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durability hook for store mutations

use crate::{Wal, WalError};
use fx_core::Operation;
use std::sync::Mutex;

/// Receives every store mutation before it becomes visible.
///
/// The stores hold the record's lock while calling `record`, so a journal
/// sees each call's operations in commit order.
pub trait Journal: Send + Sync + 'static {
    fn record(&self, op: &Operation) -> Result<(), WalError>;
}

/// Journal that keeps nothing (in-memory stores)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopJournal;

impl Journal for NoopJournal {
    fn record(&self, _op: &Operation) -> Result<(), WalError> {
        Ok(())
    }
}

/// Journal backed by an on-disk [`Wal`]
pub struct WalJournal {
    wal: Mutex<Wal>,
}

impl WalJournal {
    pub fn new(wal: Wal) -> Self {
        Self {
            wal: Mutex::new(wal),
        }
    }

    pub fn sequence(&self) -> u64 {
        self.wal.lock().unwrap_or_else(|e| e.into_inner()).sequence()
    }
}

impl Journal for WalJournal {
    fn record(&self, op: &Operation) -> Result<(), WalError> {
        let mut wal = self.wal.lock().unwrap_or_else(|e| e.into_inner());
        wal.append(op)?;
        Ok(())
    }
}
