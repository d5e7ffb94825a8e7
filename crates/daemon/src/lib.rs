// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Function daemon (fxd): configuration, lifecycle and HTTP surface

pub mod config;
pub mod lifecycle;
pub mod server;

pub use config::{Config, ConfigError, Paths};
pub use lifecycle::{startup, DaemonRuntime, DaemonState, LifecycleError, Recovery};
pub use server::{router, ApiError, ServerState};
