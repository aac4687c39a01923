use std::sync::Arc;

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use mws_core::{ApiRequest, ApiResponse, ControlMessage, Engine, FlushReport, QueuedRequest};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;

/// Largest request body forwarded through the engine.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Headers that describe a single hop and are not forwarded.
const HOP_HEADERS: [&str; 5] = [
    "host",
    "connection",
    "content-length",
    "transfer-encoding",
    "accept-encoding",
];

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

impl AppState {
    pub const fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

pub fn app_router(state: AppState) -> Router {
    let control = Router::new()
        .route("/health", get(health))
        .route("/message", post(post_message))
        .route("/flush", post(flush))
        .route("/connectivity", put(set_connectivity))
        .route("/queue", get(queue));

    Router::new()
        .nest("/__engine", control)
        .fallback(forward)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    lifecycle: String,
    online: bool,
    queued: u64,
    timestamp: i64,
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let engine = &state.engine;
    Ok(Json(HealthResponse {
        status: "ok",
        lifecycle: engine.lifecycle().state().to_string(),
        online: engine.connectivity().is_online(),
        queued: engine.queue().len().await?,
        timestamp: Utc::now().timestamp(),
    }))
}

#[derive(Debug, Serialize)]
struct LifecycleResponse {
    state: String,
}

async fn post_message(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<LifecycleResponse>, AppError> {
    let message = ControlMessage::parse(&body)?;
    let lifecycle = state.engine.post_message(message).await?;
    Ok(Json(LifecycleResponse {
        state: lifecycle.to_string(),
    }))
}

async fn flush(State(state): State<AppState>) -> Result<Json<FlushReport>, AppError> {
    Ok(Json(state.engine.flush().await?))
}

#[derive(Debug, Deserialize)]
struct ConnectivityRequest {
    online: bool,
}

#[derive(Debug, Serialize)]
struct ConnectivityResponse {
    online: bool,
    flush: Option<FlushReport>,
}

async fn set_connectivity(
    State(state): State<AppState>,
    Json(request): Json<ConnectivityRequest>,
) -> Result<Json<ConnectivityResponse>, AppError> {
    let flush = state.engine.set_online(request.online).await?;
    tracing::info!(online = request.online, "Connectivity updated");
    Ok(Json(ConnectivityResponse {
        online: request.online,
        flush,
    }))
}

async fn queue(State(state): State<AppState>) -> Result<Json<Vec<QueuedRequest>>, AppError> {
    Ok(Json(state.engine.queue().drain_in_order().await?))
}

async fn forward(State(state): State<AppState>, request: Request) -> Result<Response, AppError> {
    let api_request = to_api_request(&state.engine, request).await?;
    let response = state.engine.handle(api_request).await?;
    Ok(into_http_response(response))
}

async fn to_api_request(engine: &Engine, request: Request) -> Result<ApiRequest, AppError> {
    let (parts, body) = request.into_parts();
    let path = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);

    let mut api_request = ApiRequest::parse(parts.method, &engine.config().api_url(&path))?;
    for (name, value) in &parts.headers {
        if HOP_HEADERS.contains(&name.as_str()) {
            continue;
        }
        if let Ok(value) = value.to_str() {
            api_request = api_request.with_header(name.as_str(), value);
        }
    }

    let body: Bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AppError::bad_request(format!("cannot read request body: {e}")))?;
    if !body.is_empty() {
        api_request = api_request.with_body(body.to_vec());
    }
    Ok(api_request)
}

fn into_http_response(response: ApiResponse) -> Response {
    let mut http_response = (response.status, Body::from(response.body)).into_response();
    let headers = http_response.headers_mut();
    for (name, value) in response.headers {
        if HOP_HEADERS.contains(&name.as_str()) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            headers.insert(name, value);
        }
    }
    http_response
}
