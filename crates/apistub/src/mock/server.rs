use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn body_as_string(&self) -> Option<String> {
        String::from_utf8(self.body.clone()).ok()
    }

    pub fn body_as_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Responses served, in order, for one request path. The query string is
/// ignored when routing. Once exhausted the last response repeats.
#[derive(Clone, Debug)]
pub struct MockRoute {
    path: String,
    responders: Vec<MockResponse>,
}

impl MockRoute {
    pub fn new(path: impl Into<String>, responders: Vec<MockResponse>) -> Self {
        Self {
            path: path.into(),
            responders,
        }
    }

    pub fn single(path: impl Into<String>, responder: MockResponse) -> Self {
        Self::new(path, vec![responder])
    }
}

#[derive(Clone, Debug)]
pub enum MockResponse {
    Json(MockJsonResponse),
}

impl MockResponse {
    pub fn gemini_text(text: impl Into<String>) -> Self {
        MockResponse::Json(MockJsonResponse::new(serde_json::json!({
            "candidates": [
                {
                    "content": {
                        "parts": [{ "text": text.into() }],
                        "role": "model"
                    },
                    "finishReason": "STOP"
                }
            ]
        })))
    }

    pub fn bedrock_text(text: impl Into<String>) -> Self {
        MockResponse::Json(MockJsonResponse::new(serde_json::json!({
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "text", "text": text.into() }],
            "stop_reason": "end_turn"
        })))
    }

    pub fn status(status: u16, body: serde_json::Value) -> Self {
        MockResponse::Json(MockJsonResponse::new(body).with_status(status))
    }
}

#[derive(Clone, Debug)]
pub struct MockJsonResponse {
    body: serde_json::Value,
    status: u16,
}

impl MockJsonResponse {
    pub fn new(body: serde_json::Value) -> Self {
        Self { body, status: 200 }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }
}

impl IntoResponse for MockResponse {
    fn into_response(self) -> Response {
        match self {
            MockResponse::Json(json) => {
                let status =
                    StatusCode::from_u16(json.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, Json(json.body)).into_response()
            }
        }
    }
}

#[derive(Clone, Debug)]
struct RouteState {
    responders: Vec<MockResponse>,
    call_count: usize,
}

impl RouteState {
    fn next(&mut self) -> Option<MockResponse> {
        let last = self.responders.len().checked_sub(1)?;
        let idx = self.call_count.min(last);
        self.call_count += 1;
        Some(self.responders[idx].clone())
    }
}

#[derive(Default)]
struct MockServerState {
    routes: Mutex<HashMap<String, RouteState>>,
    recordings: Mutex<Vec<RecordedRequest>>,
}

async fn record_and_respond(
    State(state): State<Arc<MockServerState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    state.recordings.lock().await.push(RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: body.to_vec(),
    });

    let response = state
        .routes
        .lock()
        .await
        .get_mut(uri.path())
        .and_then(RouteState::next);

    match response {
        Some(response) => response.into_response(),
        None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

/// A local HTTP server standing in for a vendor API.
pub struct MockLLMServer {
    addr: SocketAddr,
    state: Arc<MockServerState>,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    join_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl MockLLMServer {
    pub async fn start(routes: Vec<MockRoute>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = Arc::new(MockServerState::default());
        {
            let mut map = state.routes.lock().await;
            for route in routes {
                map.insert(
                    route.path,
                    RouteState {
                        responders: route.responders,
                        call_count: 0,
                    },
                );
            }
        }

        let app = Router::new()
            .fallback(record_and_respond)
            .with_state(state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let join_handle = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;

            if let Err(err) = served {
                tracing::error!(error = %err, "mock server stopped");
            }
        });

        Ok(Self {
            addr,
            state,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            join_handle: Mutex::new(Some(join_handle)),
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn shutdown(&self) {
        if let Some(tx) = self.shutdown_tx.lock().await.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.join_handle.lock().await.take() {
            let _ = handle.await;
        }
    }

    pub async fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.state.recordings.lock().await.clone()
    }

    pub async fn requests_for(&self, path: &str) -> Vec<RecordedRequest> {
        self.recorded_requests()
            .await
            .into_iter()
            .filter(|record| record.path == path)
            .collect()
    }
}

impl Drop for MockLLMServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.get_mut().take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.join_handle.get_mut().take() {
            handle.abort();
        }
    }
}
