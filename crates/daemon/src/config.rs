// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration file
//!
//! Every key has a default, so an empty file (or no file at all) gives a
//! daemon on `127.0.0.1:8080` with no routes.

use fx_core::{normalize_path, EngineLimits, Route, RouteError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "fxd.toml";

/// Errors from loading or validating the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("route {app}{path} is defined more than once")]
    DuplicateRoute { app: String, path: String },
    #[error("could not determine state directory")]
    NoStateDir,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    /// Largest request body accepted on the invoke endpoint
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
            max_body_bytes: 6 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Where the WAL, lock file and daemon log live
    pub state_dir: Option<PathBuf>,
}

/// Top-level daemon configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub engine: EngineLimits,
    pub storage: StorageConfig,
    pub routes: Vec<Route>,
}

/// Files the daemon keeps in its state directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub state_dir: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    pub wal_path: PathBuf,
}

impl Config {
    /// Read, parse and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Config for `fxd [CONFIG_PATH]`: the given file, else `./fxd.toml` if
    /// present, else defaults
    pub fn discover(arg: Option<&Path>) -> Result<Self, ConfigError> {
        match arg {
            Some(path) => Self::load(path),
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    Self::load(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(text)?;
        for route in &mut config.routes {
            route.path = normalize_path(&route.path);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for route in &self.routes {
            route.validate()?;
            if !seen.insert((route.app.as_str(), route.path.as_str())) {
                return Err(ConfigError::DuplicateRoute {
                    app: route.app.clone(),
                    path: route.path.clone(),
                });
            }
        }
        Ok(())
    }

    /// Resolve the state directory: configured, else `$XDG_STATE_HOME/fx`,
    /// else `~/.local/state/fx`
    pub fn paths(&self) -> Result<Paths, ConfigError> {
        let state_dir = match &self.storage.state_dir {
            Some(dir) => dir.clone(),
            None => default_state_dir()?,
        };
        Ok(Paths {
            lock_path: state_dir.join("fxd.pid"),
            log_path: state_dir.join("fxd.log"),
            wal_path: state_dir.join("wal").join("calls.wal"),
            state_dir,
        })
    }
}

fn default_state_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = dirs::state_dir() {
        return Ok(dir.join("fx"));
    }
    dirs::home_dir()
        .map(|home| home.join(".local/state/fx"))
        .ok_or(ConfigError::NoStateDir)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
