// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Submissions into the dispatcher and what comes back

use bytes::Bytes;
use fx_core::{normalize_path, Call, Headers};
use std::collections::BTreeMap;

/// A request to invoke the route at `app` + `path`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub app: String,
    pub path: String,
    pub method: String,
    /// Full request URL as seen by the caller
    pub url: String,
    pub headers: Headers,
    pub body: Bytes,
}

impl CallRequest {
    pub fn new(app: impl Into<String>, path: &str) -> Self {
        Self {
            app: app.into(),
            path: normalize_path(path),
            method: "POST".to_string(),
            url: String::new(),
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// Result of [`Dispatcher::submit`](crate::Dispatcher::submit)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Synchronous call ran to a terminal status
    Completed(CallResult),
    /// Asynchronous call was queued
    Accepted { call_id: String },
}

impl Submission {
    pub fn call_id(&self) -> &str {
        match self {
            Submission::Completed(result) => &result.call.id,
            Submission::Accepted { call_id } => call_id,
        }
    }
}

/// Terminal record of a call plus what the caller gets back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResult {
    /// The record as committed in its terminal status
    pub call: Call,
    /// Function stdout
    pub body: Bytes,
    /// Failure or timeout detail; `None` on success
    pub message: Option<String>,
    /// Route headers for the response
    pub headers: BTreeMap<String, Vec<String>>,
}
