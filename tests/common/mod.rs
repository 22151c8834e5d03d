//! Shared helpers for integration tests: a fake Perplexity API and HTTP
//! helpers for driving the router in-process.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

/// A request seen by the fake provider
#[derive(Debug, Clone)]
pub struct ProviderCall {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct FakeProviderState {
    status: StatusCode,
    body: String,
    calls: Arc<Mutex<Vec<ProviderCall>>>,
}

/// Fake `/chat/completions` endpoint on an ephemeral loopback port
pub struct FakeProvider {
    pub base_url: String,
    calls: Arc<Mutex<Vec<ProviderCall>>>,
}

impl FakeProvider {
    /// Serve `body` with `status` for every completion request
    pub async fn start(status: u16, body: impl Into<String>) -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let state = FakeProviderState {
            status: StatusCode::from_u16(status).expect("valid status"),
            body: body.into(),
            calls: Arc::clone(&calls),
        };
        let app = Router::new()
            .route("/chat/completions", post(fake_completion))
            .with_state(state);
        Self::serve(app, calls).await
    }

    /// Serve a JSON completion with `content` and optional citations
    pub async fn answering(content: &str, citations: Option<&[&str]>) -> Self {
        let mut body = serde_json::json!({
            "id": "cmpl-1",
            "model": "sonar-pro",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        });
        if let Some(citations) = citations {
            body["citations"] = serde_json::json!(citations);
        }
        Self::start(200, body.to_string()).await
    }

    /// Serve an arbitrary router, e.g. one that breaks mid-body
    pub async fn serve(app: Router, calls: Arc<Mutex<Vec<ProviderCall>>>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake provider");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake provider");
        });
        Self {
            base_url: format!("http://{}", addr),
            calls,
        }
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }
}

async fn fake_completion(
    State(state): State<FakeProviderState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    state.calls.lock().unwrap().push(ProviderCall {
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });
    (
        state.status,
        [("content-type", "application/json")],
        state.body.clone(),
    )
        .into_response()
}

/// Send one request through the router
pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("router is infallible")
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Read a full response body as JSON
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).expect("JSON body")
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
