// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory route registry

use super::{RegistryError, RouteRegistry};
use async_trait::async_trait;
use fx_core::{normalize_path, Route, RouteError};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Routes held in memory, keyed by app then normalized path
#[derive(Clone, Default)]
pub struct StaticRouteRegistry {
    apps: Arc<RwLock<HashMap<String, HashMap<String, Route>>>>,
}

impl StaticRouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from validated routes
    pub fn from_routes(routes: impl IntoIterator<Item = Route>) -> Result<Self, RouteError> {
        let registry = Self::new();
        for route in routes {
            registry.insert(route)?;
        }
        Ok(registry)
    }

    /// Add or replace a route
    pub fn insert(&self, mut route: Route) -> Result<(), RouteError> {
        route.validate()?;
        route.path = normalize_path(&route.path);
        self.apps
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(route.app.clone())
            .or_default()
            .insert(route.path.clone(), route);
        Ok(())
    }

    /// Remove a route, returning it if present
    pub fn remove(&self, app: &str, path: &str) -> Option<Route> {
        let mut apps = self.apps.write().unwrap_or_else(|e| e.into_inner());
        let routes = apps.get_mut(app)?;
        let removed = routes.remove(&normalize_path(path));
        if routes.is_empty() {
            apps.remove(app);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.apps
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(HashMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RouteRegistry for StaticRouteRegistry {
    async fn resolve_route(&self, app: &str, path: &str) -> Result<Route, RegistryError> {
        let apps = self.apps.read().unwrap_or_else(|e| e.into_inner());
        let routes = apps
            .get(app)
            .ok_or_else(|| RegistryError::AppNotFound(app.to_string()))?;
        let path = normalize_path(path);
        routes
            .get(&path)
            .cloned()
            .ok_or_else(|| RegistryError::RouteNotFound {
                app: app.to_string(),
                path,
            })
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
