//! HTTP server: SSE sessions plus the direct-call endpoint

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use super::direct::direct_call_handler;
use super::session::{SessionEvent, SessionManager};
use crate::completion::CompletionProvider;
use crate::mcp::{McpHandler, McpRequest, SessionHandler, ToolDispatcher, JSONRPC_VERSION};

pub const SSE_PATH: &str = "/sse";
pub const MESSAGES_PATH: &str = "/messages";
pub const DIRECT_CALL_PATH: &str = "/api/tools/call";

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Shared state for all routes
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub handler: Arc<dyn McpHandler>,
    pub dispatcher: ToolDispatcher,
}

impl AppState {
    /// Wire the dispatcher and session runtime around a completion provider
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        let dispatcher = ToolDispatcher::new(provider);
        Self {
            sessions: Arc::new(SessionManager::new()),
            handler: Arc::new(SessionHandler::new(dispatcher.clone())),
            dispatcher,
        }
    }
}

/// MCP HTTP server
pub struct McpHttpServer {
    state: AppState,
    addr: SocketAddr,
}

impl McpHttpServer {
    pub fn new(state: AppState, addr: SocketAddr) -> Self {
        Self { state, addr }
    }

    /// Build the router
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route(SSE_PATH, get(sse_handler))
            .route(MESSAGES_PATH, post(messages_handler))
            .route(DIRECT_CALL_PATH, post(direct_call_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Serve until Ctrl-C or SIGTERM.
    ///
    /// Open SSE sessions are closed on shutdown so their streams end and the
    /// server can drain.
    pub async fn start(self) -> std::io::Result<()> {
        let sessions = Arc::clone(&self.state.sessions);
        let app = Self::router(self.state);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!(
            "Perplexity MCP Server running on http://{}",
            listener.local_addr()?
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let closed = sessions.close_all();
                tracing::info!(closed, "Shutting down");
            })
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Liveness endpoint
async fn root_handler() -> &'static str {
    "Perplexity MCP Server is running!"
}

/// Health check endpoint
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "sessions": state.sessions.len(),
    }))
}

/// Open an SSE session
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = state.sessions.open(MESSAGES_PATH);
    tracing::debug!(session_id = stream.id(), "SSE client connected");

    let events = stream.map(|event| {
        Ok::<_, Infallible>(match event {
            SessionEvent::Endpoint(uri) => Event::default().event("endpoint").data(uri),
            SessionEvent::Message(json) => Event::default().event("message").data(json),
        })
    });

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}

#[derive(Debug, Deserialize)]
struct MessagesQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// Deliver a JSON-RPC message to a session.
///
/// Answers 202 once the message is accepted; the JSON-RPC response goes out
/// on the session's event stream.
async fn messages_handler(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
    body: Bytes,
) -> Response {
    let session = match query
        .session_id
        .as_deref()
        .map(|id| state.sessions.resolve(id))
    {
        Some(Ok(session)) => session,
        Some(Err(e)) => {
            tracing::debug!("{}", e);
            return no_transport();
        }
        None => return no_transport(),
    };

    let request: McpRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, format!("Invalid message: {}", e)).into_response();
        }
    };
    if request.jsonrpc != JSONRPC_VERSION {
        return (
            StatusCode::BAD_REQUEST,
            "Invalid message: jsonrpc must be '2.0'",
        )
            .into_response();
    }

    tracing::debug!(
        session_id = session.id(),
        method = %request.method,
        "Session message received"
    );

    let handler = Arc::clone(&state.handler);
    tokio::spawn(async move {
        if let Some(response) = handler.handle_request(request).await {
            if let Err(e) = session.send(&response) {
                tracing::warn!("Dropping response: {}", e);
            }
        }
    });

    (StatusCode::ACCEPTED, "Accepted").into_response()
}

fn no_transport() -> Response {
    (StatusCode::BAD_REQUEST, "No transport found for sessionId").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::types::Message;
    use async_trait::async_trait;

    struct NeverCalled;

    #[async_trait]
    impl CompletionProvider for NeverCalled {
        async fn complete(&self, _messages: &[Message], _model: &str) -> Result<String> {
            unreachable!("provider should not be called")
        }
    }

    #[test]
    fn test_app_state_starts_empty() {
        let state = AppState::new(Arc::new(NeverCalled));
        assert!(state.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_root_handler() {
        assert_eq!(root_handler().await, "Perplexity MCP Server is running!");
    }
}
