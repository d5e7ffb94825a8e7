// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Function Daemon (fxd)
//!
//! Serves function invocations over HTTP and keeps call records in a WAL.
//!
//! Usage: `fxd [CONFIG_PATH]`

use std::path::PathBuf;

use fx_daemon::{lifecycle, router, Config, LifecycleError, Paths, ServerState};
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse arguments
    let config_arg = std::env::args_os().nth(1).map(PathBuf::from);

    // Load configuration
    let config = Config::discover(config_arg.as_deref())?;
    let paths = config.paths()?;

    // Write startup marker to log (before tracing setup)
    write_startup_marker(&paths)?;

    // Set up logging
    let log_guard = setup_logging(&paths)?;

    info!(
        state_dir = %paths.state_dir.display(),
        routes = config.routes.len(),
        "Starting fxd"
    );

    // Start daemon
    let daemon = match lifecycle::startup(&config).await {
        Ok(d) => d,
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&paths, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    // Set up signal handlers
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let listener = match TcpListener::bind(config.server.listen).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.server.listen, e);
            daemon.shutdown().await?;
            return Err(e.into());
        }
    };
    let app = router(
        ServerState::from_runtime(&daemon.runtime),
        config.server.max_body_bytes,
    );

    info!("Daemon ready, listening on {}", listener.local_addr()?);

    // Signal ready for parent process
    println!("READY");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
            }
        })
        .await;
    if let Err(e) = served {
        error!("HTTP server failed: {}", e);
    }

    daemon.shutdown().await?;
    info!("Daemon stopped");
    Ok(())
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- fxd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- fxd: starting (pid: ";

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(paths: &Paths) -> Result<(), LifecycleError> {
    use std::io::Write;

    std::fs::create_dir_all(&paths.state_dir)?;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file
fn write_startup_error(paths: &Paths, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

fn setup_logging(
    paths: &Paths,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let dir = paths.log_path.parent().unwrap_or(&paths.state_dir);
    std::fs::create_dir_all(dir)?;

    // Set up file appender
    let file_name = paths
        .log_path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("fxd.log"));
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Set up subscriber with env filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
