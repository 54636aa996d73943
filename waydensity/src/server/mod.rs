//! HTTP endpoint
//!
//! `POST /process-area` with `{"polygon": [[lat, lon], ...]}` returns the
//! [`AreaReport`](crate::aggregate::AreaReport) as JSON. Callers that send an
//! `x-client-id` header get supersession: a newer request from the same id
//! cancels the older one, which then answers 409.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::error::ProcessError;
use crate::overpass::AsyncHttpClient;
use crate::pipeline::AreaProcessor;
use crate::supervisor::RequestSupervisor;

/// Header carrying the caller's identity for supersession.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Shared handler state.
pub struct AppState<C: AsyncHttpClient> {
    processor: Arc<AreaProcessor<C>>,
    supervisor: RequestSupervisor,
}

impl<C: AsyncHttpClient> AppState<C> {
    pub fn new(processor: AreaProcessor<C>) -> Self {
        Self {
            processor: Arc::new(processor),
            supervisor: RequestSupervisor::new(),
        }
    }

    pub fn supervisor(&self) -> &RequestSupervisor {
        &self.supervisor
    }
}

impl<C: AsyncHttpClient> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            processor: Arc::clone(&self.processor),
            supervisor: self.supervisor.clone(),
        }
    }
}

/// Builds the application router.
pub fn router<C: AsyncHttpClient + 'static>(state: AppState<C>) -> Router {
    Router::new()
        .route("/process-area", post(process_area::<C>))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `addr` and serves until `shutdown` fires.
pub async fn serve<C: AsyncHttpClient + 'static>(
    addr: SocketAddr,
    state: AppState<C>,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    serve_on(listener, state, shutdown).await
}

/// Serves on an already bound listener.
///
/// On shutdown every in-flight request is cancelled before the server
/// drains its connections.
pub async fn serve_on<C: AsyncHttpClient + 'static>(
    listener: TcpListener,
    state: AppState<C>,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    if let Ok(local) = listener.local_addr() {
        info!(addr = %local, "Listening");
    }

    let supervisor = state.supervisor.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            info!("Shutting down, cancelling in-flight requests");
            supervisor.shutdown();
        })
        .await
        .map_err(ServerError::Serve)
}

async fn health() -> &'static str {
    "ok"
}

async fn process_area<C: AsyncHttpClient + 'static>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let pairs = match parse_polygon(&body) {
        Ok(pairs) => pairs,
        Err(message) => return error_body(StatusCode::BAD_REQUEST, message),
    };

    let client_id = headers
        .get(CLIENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|id| !id.is_empty());
    let ticket = client_id.map(|id| state.supervisor.begin(id));
    let token = match &ticket {
        Some(ticket) => ticket.token().clone(),
        None => state.supervisor.untracked(),
    };

    match state.processor.process(&pairs, &token).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome.report)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Extracts the `polygon` field as raw `[lat, lon]` pairs.
fn parse_polygon(body: &[u8]) -> Result<Vec<Vec<f64>>, &'static str> {
    let value: Value = serde_json::from_slice(body).map_err(|_| "Request body is not valid JSON")?;
    match value.get("polygon") {
        None | Some(Value::Null) => Err("Polygon not provided"),
        Some(polygon) => serde_json::from_value(polygon.clone())
            .map_err(|_| "Polygon must be a list of [lat, lon] pairs"),
    }
}

fn error_response(e: &ProcessError) -> Response {
    match e {
        ProcessError::InvalidInput(message) => {
            warn!(error = %message, "Rejected polygon");
            error_body(StatusCode::BAD_REQUEST, message)
        }
        ProcessError::Cancelled => error_body(StatusCode::CONFLICT, "request superseded"),
        ProcessError::Internal(message) => {
            error!(error = %message, "Area processing failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
