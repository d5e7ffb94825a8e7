// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route definitions resolved at dispatch time

use crate::call::ExecutionMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Timeout applied when a route does not set one (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Upper bound on a route timeout (seconds)
pub const MAX_TIMEOUT_SECS: u64 = 3600;
/// Memory assigned when a route does not set it (MiB)
pub const DEFAULT_MEMORY_MB: u64 = 128;

/// A registered function endpoint within an app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub app: String,
    pub path: String,
    /// What the runner executes for this route
    pub image: String,
    #[serde(default)]
    pub mode: ExecutionMode,
    /// Execution timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Memory limit in MiB, passed through to the function
    #[serde(default = "default_memory")]
    pub memory: u64,
    /// Passed to the function as environment variables
    #[serde(default)]
    pub config: BTreeMap<String, String>,
    /// Added to every synchronous response
    #[serde(default)]
    pub headers: BTreeMap<String, Vec<String>>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_memory() -> u64 {
    DEFAULT_MEMORY_MB
}

fn default_enabled() -> bool {
    true
}

/// Errors from route validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route {path}: app name is empty")]
    EmptyApp { path: String },
    #[error("route {app}{path}: path must start with '/'")]
    InvalidPath { app: String, path: String },
    #[error("route {app}{path}: image is empty")]
    EmptyImage { app: String, path: String },
    #[error("route {app}{path}: timeout {timeout}s outside 1..={max}s", max = MAX_TIMEOUT_SECS)]
    InvalidTimeout {
        app: String,
        path: String,
        timeout: u64,
    },
}

impl Route {
    /// A synchronous, enabled route with default limits
    pub fn new(app: impl Into<String>, path: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            path: path.into(),
            image: image.into(),
            mode: ExecutionMode::Sync,
            timeout: DEFAULT_TIMEOUT_SECS,
            memory: DEFAULT_MEMORY_MB,
            config: BTreeMap::new(),
            headers: BTreeMap::new(),
            enabled: true,
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(name.into()).or_default().push(value.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn validate(&self) -> Result<(), RouteError> {
        if self.app.trim().is_empty() {
            return Err(RouteError::EmptyApp {
                path: self.path.clone(),
            });
        }
        if !self.path.starts_with('/') {
            return Err(RouteError::InvalidPath {
                app: self.app.clone(),
                path: self.path.clone(),
            });
        }
        if self.image.trim().is_empty() {
            return Err(RouteError::EmptyImage {
                app: self.app.clone(),
                path: self.path.clone(),
            });
        }
        if self.timeout == 0 || self.timeout > MAX_TIMEOUT_SECS {
            return Err(RouteError::InvalidTimeout {
                app: self.app.clone(),
                path: self.path.clone(),
                timeout: self.timeout,
            });
        }
        Ok(())
    }
}

/// Normalize a request path so `hello`, `/hello` and `/hello/` match one route
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    format!("/{trimmed}")
}

#[cfg(test)]
#[path = "route_tests.rs"]
mod tests;
