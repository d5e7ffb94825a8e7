// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface
//!
//! - `ANY /r/{app}/{*path}` invokes a route
//! - `GET /apps/{app}/calls[?path=]` lists calls, newest first
//! - `GET /apps/{app}/calls/{call_id}` returns a call record
//! - `GET /apps/{app}/calls/{call_id}/log` returns a call's log
//! - `GET /health`

use axum::extract::{DefaultBodyLimit, FromRef, Path, Query, State};
use axum::http::header::HOST;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use bytes::Bytes;
use fx_adapters::{FunctionRunner, RouteRegistry};
use fx_core::{normalize_path, CallStatus, Clock, Headers, IdGen};
use fx_engine::{
    CallQuery, CallRequest, CallResult, DispatchError, Dispatcher, QueryError, Runtime, Submission,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

/// Response header carrying the call ID of a synchronous call
pub const CALL_ID_HEADER: &str = "fn_call_id";

/// Shared handler state
pub struct ServerState<R, F, C, I> {
    dispatcher: Dispatcher<R, F, C, I>,
    query: CallQuery,
    workers: usize,
}

impl<R, F, C, I> Clone for ServerState<R, F, C, I>
where
    Dispatcher<R, F, C, I>: Clone,
{
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            query: self.query.clone(),
            workers: self.workers,
        }
    }
}

impl<R, F, C, I> ServerState<R, F, C, I>
where
    R: RouteRegistry,
    F: FunctionRunner,
    C: Clock,
    I: IdGen,
{
    pub fn from_runtime(runtime: &Runtime<R, F, C, I>) -> Self {
        Self {
            dispatcher: runtime.dispatcher().clone(),
            query: runtime.query().clone(),
            workers: runtime.workers(),
        }
    }
}

impl<R, F, C, I> FromRef<ServerState<R, F, C, I>> for CallQuery {
    fn from_ref(state: &ServerState<R, F, C, I>) -> Self {
        state.query.clone()
    }
}

/// Build the router for the daemon's HTTP listener
pub fn router<R, F, C, I>(state: ServerState<R, F, C, I>, max_body_bytes: usize) -> Router
where
    R: RouteRegistry,
    F: FunctionRunner,
    C: Clock,
    I: IdGen,
{
    Router::new()
        .route("/health", get(health::<R, F, C, I>))
        .route("/r/{app}/{*path}", any(invoke::<R, F, C, I>))
        .route("/apps/{app}/calls", get(list_calls))
        .route("/apps/{app}/calls/{call_id}", get(get_call))
        .route("/apps/{app}/calls/{call_id}/log", get(get_log))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Error body: `{"error": {"message": ...}}`, plus `request_id` for calls
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    request_id: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "error": { "message": self.message } });
        if let Some(id) = self.request_id {
            body["request_id"] = json!(id);
        }
        (self.status, Json(body)).into_response()
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        let status = match &err {
            DispatchError::AppNotFound(_) | DispatchError::RouteNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            DispatchError::RouteDisabled { .. } | DispatchError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            DispatchError::QueueFull { .. }
            | DispatchError::RegistryUnavailable(_)
            | DispatchError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::TaskFailed(_) | DispatchError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        let status = match &err {
            QueryError::NotFound(_) => StatusCode::NOT_FOUND,
            QueryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

async fn health<R, F, C, I>(State(state): State<ServerState<R, F, C, I>>) -> Json<serde_json::Value>
where
    R: RouteRegistry,
    F: FunctionRunner,
    C: Clock,
    I: IdGen,
{
    Json(json!({
        "status": "ok",
        "queued": state.dispatcher.queue().len(),
        "workers": state.workers,
    }))
}

async fn invoke<R, F, C, I>(
    State(state): State<ServerState<R, F, C, I>>,
    Path((app, path)): Path<(String, String)>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    R: RouteRegistry,
    F: FunctionRunner,
    C: Clock,
    I: IdGen,
{
    let url = match headers.get(HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("http://{host}{uri}"),
        None => uri.to_string(),
    };
    let mut request = CallRequest::new(app, &path)
        .with_method(method.as_str())
        .with_url(url)
        .with_body(body);
    request.headers = request_headers(&headers);

    match state.dispatcher.submit(request).await {
        Ok(Submission::Completed(result)) => completed(result),
        Ok(Submission::Accepted { call_id }) => {
            (StatusCode::ACCEPTED, Json(json!({ "call_id": call_id }))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Request headers in arrival order, repeats kept
fn request_headers(headers: &HeaderMap) -> Headers {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

fn completed(result: CallResult) -> Response {
    let call_id = result.call.id.clone();
    let message = result.message.unwrap_or_default();
    let mut response = match result.call.status {
        CallStatus::Success => {
            let mut response = (StatusCode::OK, result.body).into_response();
            for (name, values) in &result.headers {
                let Ok(header) = HeaderName::from_bytes(name.as_bytes()) else {
                    warn!(header = %name, "skipping invalid route header");
                    continue;
                };
                // Route headers replace defaults such as content-type
                response.headers_mut().remove(&header);
                for value in values {
                    match HeaderValue::from_str(value) {
                        Ok(value) => {
                            response.headers_mut().append(header.clone(), value);
                        }
                        Err(_) => warn!(header = %name, "skipping invalid route header value"),
                    }
                }
            }
            response
        }
        CallStatus::Timeout => ApiError::new(StatusCode::GATEWAY_TIMEOUT, message)
            .with_request_id(&call_id)
            .into_response(),
        _ => ApiError::new(StatusCode::BAD_GATEWAY, message)
            .with_request_id(&call_id)
            .into_response(),
    };
    if let Ok(value) = HeaderValue::from_str(&call_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(CALL_ID_HEADER), value);
    }
    response
}

#[derive(Debug, Deserialize)]
struct ListParams {
    path: Option<String>,
}

async fn list_calls(
    State(query): State<CallQuery>,
    Path(app): Path<String>,
    Query(params): Query<ListParams>,
) -> Json<serde_json::Value> {
    let path = params.path.as_deref().map(normalize_path);
    let calls = query.list_calls(&app, path.as_deref());
    Json(json!({
        "message": "Successfully listed calls",
        "calls": calls,
    }))
}

async fn get_call(
    State(query): State<CallQuery>,
    Path((app, call_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let call = query.get_status_in(&app, &call_id)?;
    Ok(Json(json!({
        "message": "Successfully loaded call",
        "call": call,
    })))
}

async fn get_log(
    State(query): State<CallQuery>,
    Path((app, call_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let log = query.get_log_in(&app, &call_id)?;
    Ok(Json(json!({
        "message": "Successfully loaded log",
        "log": log,
    })))
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
