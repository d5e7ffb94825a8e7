// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fx-core: data model for the function call engine
//!
//! This crate provides:
//! - The call record and its status state machine
//! - Ordered request headers with folding
//! - Route definitions
//! - Journal operations, clock and ID abstractions, engine limits

pub mod call;
pub mod clock;
pub mod headers;
pub mod id;
pub mod limits;
pub mod operation;
pub mod route;

pub use call::{Call, CallError, CallStatus, ExecutionMode};
pub use clock::{Clock, FakeClock, SystemClock};
pub use headers::{Headers, HEADER_SEPARATOR};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use limits::EngineLimits;
pub use operation::Operation;
pub use route::{normalize_path, Route, RouteError};
