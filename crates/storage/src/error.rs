// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage errors

use crate::WalError;
use fx_core::CallError;
use thiserror::Error;

/// Errors from the call and log stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("call not found: {0}")]
    NotFound(String),
    #[error("call already exists: {0}")]
    AlreadyExists(String),
    #[error(transparent)]
    Transition(#[from] CallError),
    #[error("journal error: {0}")]
    Journal(#[from] WalError),
}
