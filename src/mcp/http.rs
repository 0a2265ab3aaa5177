//! HTTP and SSE transports.
//!
//! One axum router serves both network transports:
//!
//! | Route | Purpose |
//! |---|---|
//! | `POST /mcp` | JSON-RPC request in the body, response in the reply |
//! | `GET /sse` | event stream; the first `endpoint` event names the POST URL |
//! | `POST /message?sessionId=<id>` | JSON-RPC request; reply delivered as a `message` event |
//! | `GET /health` | liveness probe |
//!
//! Request handling is synchronous store work, so it runs on the blocking
//! pool via [`tokio::task::spawn_blocking`].

use super::server::{INVALID_REQUEST, McpServer, format_error};
use crate::{Error, Result};
use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Pending responses buffered per SSE session.
const SESSION_BUFFER: usize = 32;

type Sessions = Arc<Mutex<HashMap<Uuid, mpsc::Sender<String>>>>;

/// Shared state for the HTTP router.
#[derive(Clone)]
pub struct HttpState {
    server: Arc<McpServer>,
    sessions: Sessions,
}

impl HttpState {
    /// Creates state with no open SSE sessions.
    #[must_use]
    pub fn new(server: Arc<McpServer>) -> Self {
        Self {
            server,
            sessions: Arc::default(),
        }
    }

    /// Number of open SSE sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        lock_sessions(&self.sessions).len()
    }

    fn session(&self, id: &Uuid) -> Option<mpsc::Sender<String>> {
        lock_sessions(&self.sessions).get(id).cloned()
    }
}

fn lock_sessions(
    sessions: &Sessions,
) -> std::sync::MutexGuard<'_, HashMap<Uuid, mpsc::Sender<String>>> {
    sessions.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes its session from the map when the SSE stream is dropped.
struct SessionGuard {
    id: Uuid,
    sessions: Sessions,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        lock_sessions(&self.sessions).remove(&self.id);
        tracing::info!(session = %self.id, "SSE client disconnected");
    }
}

/// Builds the router for `server`.
pub fn router(server: Arc<McpServer>) -> Router {
    router_with_state(HttpState::new(server))
}

/// Builds the router over existing state.
pub fn router_with_state(state: HttpState) -> Router {
    Router::new()
        .route("/mcp", post(handle_mcp))
        .route("/sse", get(handle_sse))
        .route("/message", post(handle_message))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the router on `0.0.0.0:port` until Ctrl-C.
///
/// Builds its own multi-threaded runtime.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the runtime cannot start, the
/// port cannot be bound, or the server fails.
pub fn serve(server: Arc<McpServer>, port: u16) -> Result<()> {
    let transport = server.transport();
    let app = router(server);

    let rt = tokio::runtime::Runtime::new().map_err(|e| Error::OperationFailed {
        operation: "create_runtime".to_string(),
        cause: e.to_string(),
    })?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    rt.block_on(async {
        let listener =
            tokio::net::TcpListener::bind(addr)
                .await
                .map_err(|e| Error::OperationFailed {
                    operation: "bind".to_string(),
                    cause: format!("{addr}: {e}"),
                })?;
        tracing::info!(%addr, %transport, "MCP server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::OperationFailed {
                operation: "serve".to_string(),
                cause: e.to_string(),
            })
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Runs one request on the blocking pool.
async fn dispatch(
    server: Arc<McpServer>,
    body: String,
) -> std::result::Result<Option<String>, Response> {
    tokio::task::spawn_blocking(move || server.handle_request(&body))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Request handler panicked");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        })
}

fn json_response(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn handle_mcp(State(state): State<HttpState>, body: String) -> Response {
    match dispatch(state.server, body).await {
        Ok(Some(reply)) => json_response(StatusCode::OK, reply),
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Err(response) => response,
    }
}

async fn handle_sse(
    State(state): State<HttpState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(SESSION_BUFFER);
    lock_sessions(&state.sessions).insert(id, tx);
    tracing::info!(session = %id, "SSE client connected");

    let guard = SessionGuard {
        id,
        sessions: Arc::clone(&state.sessions),
    };
    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/message?sessionId={id}"));
    let messages = ReceiverStream::new(rx).map(move |message| {
        let _session = &guard;
        Ok::<_, Infallible>(Event::default().event("message").data(message))
    });

    let stream = tokio_stream::once(Ok::<_, Infallible>(endpoint)).chain(messages);
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Query string of `POST /message`.
#[derive(Debug, Deserialize)]
pub struct MessageParams {
    /// Session id from the `endpoint` event.
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

async fn handle_message(
    State(state): State<HttpState>,
    Query(params): Query<MessageParams>,
    body: String,
) -> Response {
    let Ok(id) = Uuid::parse_str(&params.session_id) else {
        return json_response(
            StatusCode::BAD_REQUEST,
            format_error(None, INVALID_REQUEST, "Invalid sessionId"),
        );
    };
    let Some(sender) = state.session(&id) else {
        return json_response(
            StatusCode::NOT_FOUND,
            format_error(None, INVALID_REQUEST, "Unknown sessionId"),
        );
    };

    match dispatch(state.server, body).await {
        Ok(Some(reply)) => {
            if sender.send(reply).await.is_err() {
                lock_sessions(&state.sessions).remove(&id);
                return StatusCode::GONE.into_response();
            }
            StatusCode::ACCEPTED.into_response()
        },
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Err(response) => response,
    }
}

async fn health() -> &'static str {
    "ok"
}
