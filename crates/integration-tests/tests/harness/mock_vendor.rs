//! Mock vendor backend for integration tests
//!
//! One axum server speaks all four wire protocols. Replies are scripted
//! per route and every request body is recorded for assertions.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use switchyard_core::ProviderKind;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Vendor endpoint a request arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Responses,
    Messages,
    GenerateContent,
    ChatCompletions,
}

/// One request as the mock saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub route: Route,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Value,
}

#[derive(Default)]
struct MockState {
    replies: Mutex<HashMap<Route, VecDeque<(StatusCode, Value)>>>,
    received: Mutex<Vec<Recorded>>,
}

pub struct MockVendor {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

impl MockVendor {
    /// Start the mock server, returning immediately
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/v1/responses", routing::post(handle_responses))
            .route("/v1/messages", routing::post(handle_messages))
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .route("/v1beta/models/{*rest}", routing::post(handle_generate_content))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL to configure for `provider`
    pub fn base_url(&self, provider: ProviderKind) -> Url {
        let version = if provider == ProviderKind::Gemini { "v1beta" } else { "v1" };
        format!("http://{}/{version}", self.addr).parse().expect("valid mock URL")
    }

    /// Queue a 200 reply on `route`
    pub fn reply(&self, route: Route, body: Value) -> &Self {
        self.reply_with_status(route, StatusCode::OK, body)
    }

    pub fn reply_with_status(&self, route: Route, status: StatusCode, body: Value) -> &Self {
        self.state
            .replies
            .lock()
            .unwrap()
            .entry(route)
            .or_default()
            .push_back((status, body));
        self
    }

    /// Every request received, in arrival order
    pub fn recorded(&self) -> Vec<Recorded> {
        self.state.received.lock().unwrap().clone()
    }

    /// Request bodies received on `route`
    pub fn bodies(&self, route: Route) -> Vec<Value> {
        self.recorded()
            .into_iter()
            .filter(|r| r.route == route)
            .map(|r| r.body)
            .collect()
    }
}

impl Drop for MockVendor {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn respond(state: &MockState, route: Route, path: String, headers: HeaderMap, body: Value) -> Response {
    state.received.lock().unwrap().push(Recorded {
        route,
        path,
        headers,
        body,
    });

    let next = state
        .replies
        .lock()
        .unwrap()
        .get_mut(&route)
        .and_then(VecDeque::pop_front);

    match next {
        Some((status, body)) => (status, Json(body)).into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": {"message": "no scripted reply", "type": "server_error"}})),
        )
            .into_response(),
    }
}

// -- Handlers --

async fn handle_responses(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    respond(&state, Route::Responses, "/v1/responses".to_owned(), headers, body)
}

async fn handle_messages(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    respond(&state, Route::Messages, "/v1/messages".to_owned(), headers, body)
}

async fn handle_chat_completions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    respond(&state, Route::ChatCompletions, "/v1/chat/completions".to_owned(), headers, body)
}

async fn handle_generate_content(
    State(state): State<Arc<MockState>>,
    Path(rest): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    respond(&state, Route::GenerateContent, format!("/v1beta/models/{rest}"), headers, body)
}

// -- Canned vendor replies --

pub fn responses_text(id: &str, text: &str) -> Value {
    json!({
        "id": id,
        "model": "gpt-5",
        "output": [{"type": "message", "content": [{"type": "output_text", "text": text}]}],
        "usage": {"input_tokens": 12, "output_tokens": 4, "total_tokens": 16}
    })
}

pub fn responses_call(id: &str, call_id: &str, name: &str, arguments: &Value) -> Value {
    json!({
        "id": id,
        "model": "gpt-5",
        "output": [{"type": "function_call", "call_id": call_id, "name": name, "arguments": arguments.to_string()}],
        "usage": {"input_tokens": 30, "output_tokens": 8, "total_tokens": 38}
    })
}

pub fn anthropic_text(text: &str) -> Value {
    json!({
        "id": "msg_text",
        "model": "claude-sonnet-4",
        "content": [{"type": "text", "text": text}],
        "usage": {"input_tokens": 20, "output_tokens": 6}
    })
}

pub fn anthropic_tool_use(tool_use_id: &str, name: &str, input: &Value) -> Value {
    json!({
        "id": "msg_tool",
        "model": "claude-sonnet-4",
        "content": [
            {"type": "text", "text": "Let me check."},
            {"type": "tool_use", "id": tool_use_id, "name": name, "input": input}
        ],
        "usage": {"input_tokens": 25, "output_tokens": 9}
    })
}

pub fn gemini_text(text: &str) -> Value {
    json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}],
        "usageMetadata": {"promptTokenCount": 8, "candidatesTokenCount": 3, "totalTokenCount": 11},
        "modelVersion": "gemini-2.5-pro"
    })
}

pub fn gemini_call(name: &str, args: &Value) -> Value {
    json!({
        "candidates": [{"content": {"role": "model", "parts": [{"functionCall": {"name": name, "args": args}}]}}],
        "modelVersion": "gemini-2.5-pro"
    })
}

pub fn chat_text(text: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "model": "deepseek-chat",
        "choices": [{"message": {"role": "assistant", "content": text}}],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}
