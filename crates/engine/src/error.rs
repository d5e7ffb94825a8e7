// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for dispatch and queries

use fx_adapters::RegistryError;
use fx_storage::StoreError;
use thiserror::Error;

/// Errors returned to the submitter of a call
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("app not found: {0}")]
    AppNotFound(String),
    #[error("route not found: {app}{path}")]
    RouteNotFound { app: String, path: String },
    #[error("route disabled: {app}{path}")]
    RouteDisabled { app: String, path: String },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("call queue is full ({capacity} calls waiting)")]
    QueueFull { capacity: usize },
    #[error("route registry unavailable: {0}")]
    RegistryUnavailable(String),
    #[error("dispatcher is shutting down")]
    ShuttingDown,
    #[error("call task failed: {0}")]
    TaskFailed(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl DispatchError {
    /// Rejected before any call record was created
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DispatchError::AppNotFound(_)
                | DispatchError::RouteNotFound { .. }
                | DispatchError::RouteDisabled { .. }
                | DispatchError::InvalidRequest(_)
        )
    }
}

impl From<RegistryError> for DispatchError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::AppNotFound(app) => DispatchError::AppNotFound(app),
            RegistryError::RouteNotFound { app, path } => {
                DispatchError::RouteNotFound { app, path }
            }
            RegistryError::Unavailable(reason) => DispatchError::RegistryUnavailable(reason),
        }
    }
}

/// Errors from the read-only query surface
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("call not found: {0}")]
    NotFound(String),
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => QueryError::NotFound(id),
            other => QueryError::Store(other),
        }
    }
}
