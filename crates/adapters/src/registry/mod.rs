// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route registry adapters

mod memory;

pub use memory::StaticRouteRegistry;

use async_trait::async_trait;
use fx_core::Route;
use thiserror::Error;

/// Errors from route resolution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("app not found: {0}")]
    AppNotFound(String),
    #[error("route not found: {app}{path}")]
    RouteNotFound { app: String, path: String },
    #[error("route registry unavailable: {0}")]
    Unavailable(String),
}

/// Source of registered routes
#[async_trait]
pub trait RouteRegistry: Clone + Send + Sync + 'static {
    /// Resolve the route serving `path` within `app`
    async fn resolve_route(&self, app: &str, path: &str) -> Result<Route, RegistryError>;
}
