// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use fx_adapters::{ProcessRunner, StaticRouteRegistry, TracedFunctionRunner, TracedRouteRegistry};
use fx_core::{RouteError, SystemClock, UuidIdGen};
use fx_engine::{DispatchError, Runtime, RuntimeDeps};
use fx_storage::{MaterializedState, NoopJournal, Wal, WalError, WalJournal};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{Config, ConfigError, Paths};

/// Daemon runtime with concrete adapter types (wrapped with tracing)
pub type DaemonRuntime = Runtime<
    TracedRouteRegistry<StaticRouteRegistry>,
    TracedFunctionRunner<ProcessRunner>,
    SystemClock,
    UuidIdGen,
>;

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    #[error("WAL error: {0}")]
    Wal(#[from] WalError),

    #[error("Recovery failed: {0}")]
    Recovery(#[from] DispatchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What startup found in the WAL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Recovery {
    /// Calls loaded from the journal
    pub calls: usize,
    /// Running calls committed to `error`
    pub interrupted: usize,
    /// Calls left `queued`
    pub pending: usize,
}

/// Daemon state during operation
pub struct DaemonState {
    pub config: Config,
    pub paths: Paths,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub runtime: DaemonRuntime,
    pub recovery: Recovery,
    /// When daemon started
    pub start_time: Instant,
}

impl DaemonState {
    /// Stop the engine and release the state directory
    pub async fn shutdown(self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        // In-flight calls finish; queued calls keep their status
        self.runtime.shutdown().await;

        if self.paths.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.paths.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        info!(uptime_secs = self.start_time.elapsed().as_secs(), "Daemon shutdown complete");
        Ok(())
    }
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    let paths = config.paths()?;
    match startup_inner(config, &paths).await {
        Ok(state) => Ok(state),
        Err(e) => {
            // The lock file belongs to the daemon that holds it
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(&paths);
            }
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config, paths: &Paths) -> Result<DaemonState, LifecycleError> {
    // 1. Create state directory
    std::fs::create_dir_all(&paths.state_dir)?;

    // 2. Acquire lock file FIRST - prevents two daemons sharing one WAL
    let mut lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&paths.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // 3. Build the route registry before touching state (fail fast on bad routes)
    let registry = StaticRouteRegistry::from_routes(config.routes.iter().cloned())?;
    info!(routes = registry.len(), "Loaded routes");

    // 4. Replay the WAL, rewrite it as a checkpoint when that is shorter,
    //    then rebuild stores that journal to the same file
    if let Some(parent) = paths.wal_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let limits = config.engine.clone().normalized();
    let ops = Wal::replay(&paths.wal_path)?;
    let replayed = ops.len();
    let replayed_state =
        MaterializedState::replay(ops, limits.log_max_bytes, Arc::new(NoopJournal));
    let skipped = replayed_state.skipped();
    let checkpoint = replayed_state.checkpoint();
    if checkpoint.len() < replayed {
        Wal::rewrite(&paths.wal_path, &checkpoint)?;
        info!(before = replayed, after = checkpoint.len(), "Compacted WAL");
    }
    let journal = Arc::new(WalJournal::new(Wal::open(&paths.wal_path)?));
    let state = MaterializedState::replay(checkpoint, limits.log_max_bytes, journal);

    let interrupted = state.interrupted();
    let pending = state.pending();
    let mut recovery = Recovery {
        calls: state.calls().len(),
        interrupted: 0,
        pending: pending.len(),
    };
    if skipped > 0 {
        warn!(skipped, "WAL contained operations that could not be applied");
    }

    // 5. Start the engine
    let (calls, logs) = state.into_stores();
    let runtime = Runtime::start(
        RuntimeDeps {
            registry: TracedRouteRegistry::new(registry),
            runner: TracedFunctionRunner::new(ProcessRunner::new()),
            clock: SystemClock,
            ids: UuidIdGen,
            calls: Arc::new(calls),
            logs: Arc::new(logs),
        },
        limits,
    );

    // 6. Reconcile: calls cut short by the last exit can never finish
    recovery.interrupted = runtime.dispatcher().fail_interrupted(&interrupted)?;
    if recovery.pending > 0 {
        warn!(
            pending = recovery.pending,
            "Found calls queued before the last exit; they stay queued"
        );
    }

    info!(
        calls = recovery.calls,
        interrupted = recovery.interrupted,
        pending = recovery.pending,
        "Recovered state"
    );

    Ok(DaemonState {
        config: config.clone(),
        paths: paths.clone(),
        lock_file,
        runtime,
        recovery,
        start_time: Instant::now(),
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(paths: &Paths) {
    if paths.lock_path.exists() {
        let _ = std::fs::remove_file(&paths.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
