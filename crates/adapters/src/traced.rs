// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::registry::{RegistryError, RouteRegistry};
use crate::runner::{FunctionRunner, Invocation, RunnerError, RunnerEvent};
use async_trait::async_trait;
use fx_core::Route;
use tokio::sync::mpsc;
use tracing::Instrument;

/// Wrapper that adds tracing to any RouteRegistry
#[derive(Clone)]
pub struct TracedRouteRegistry<R> {
    inner: R,
}

impl<R> TracedRouteRegistry<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

#[async_trait]
impl<R: RouteRegistry> RouteRegistry for TracedRouteRegistry<R> {
    async fn resolve_route(&self, app: &str, path: &str) -> Result<Route, RegistryError> {
        let span = tracing::debug_span!("registry.resolve", app, path);

        let result = self.inner.resolve_route(app, path).instrument(span.clone()).await;
        let _guard = span.enter();
        match &result {
            Ok(route) => tracing::debug!(
                image = %route.image,
                mode = %route.mode,
                timeout = route.timeout,
                enabled = route.enabled,
                "resolved"
            ),
            Err(e) => tracing::info!(error = %e, "not resolved"),
        }

        result
    }
}

/// Wrapper that adds tracing to any FunctionRunner
#[derive(Clone)]
pub struct TracedFunctionRunner<F> {
    inner: F,
}

impl<F> TracedFunctionRunner<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: FunctionRunner> FunctionRunner for TracedFunctionRunner<F> {
    async fn start(
        &self,
        invocation: Invocation,
    ) -> Result<mpsc::Receiver<RunnerEvent>, RunnerError> {
        let span = tracing::info_span!(
            "runner.start",
            call_id = %invocation.call_id,
            image = %invocation.image
        );

        {
            let _guard = span.enter();

            // Precondition: an empty image can never start
            if invocation.image.trim().is_empty() {
                tracing::error!("image is empty");
                return Err(RunnerError::StartFailed("image is empty".to_string()));
            }

            tracing::info!(
                env_count = invocation.env.len(),
                body_len = invocation.body.len(),
                "starting"
            );
        }

        let start = std::time::Instant::now();
        let result = self.inner.start(invocation).instrument(span.clone()).await;
        let elapsed = start.elapsed();
        let _guard = span.enter();

        match &result {
            Ok(_) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "started"),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "start failed"
            ),
        }

        result
    }

    async fn reclaim(&self, call_id: &str) -> Result<(), RunnerError> {
        let span = tracing::info_span!("runner.reclaim", call_id);

        let result = self.inner.reclaim(call_id).instrument(span.clone()).await;
        let _guard = span.enter();
        // reclaim() failing is often acceptable (run already gone)
        match &result {
            Ok(()) => tracing::info!("reclaimed"),
            Err(e) => tracing::warn!(error = %e, "reclaim failed (may be expected)"),
        }

        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
