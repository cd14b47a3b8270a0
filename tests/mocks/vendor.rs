//! Mock vendor API for testing
//!
//! Provides wiremock-based mocks for the vendor endpoints providers call:
//! - POST /chat/completions - OpenAI-compatible chat (streaming and non-streaming)
//! - POST /chat - Cohere v2 chat
//! - POST /models/{model}:streamGenerateContent - Gemini streaming
//! - POST /{model}/complete - AI21 completions
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::mocks::vendor::MockVendor;
//!
//! #[tokio::test]
//! async fn test_with_vendor_mock() {
//!     let vendor = MockVendor::start().await;
//!     vendor.mock_chat_stream(&["fn main() {}"]).await;
//!
//!     // Point GROQ_BASE_URL (or any <VENDOR>_BASE_URL) at vendor.uri()
//! }
//! ```

use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use wiremock::{
    matchers::{header_exists, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

/// Mock vendor server wrapper
pub struct MockVendor {
    server: MockServer,
}

impl MockVendor {
    /// Start a new mock vendor server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Get the mock server URI
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// JSON bodies of every request received so far
    pub async fn received_bodies(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| serde_json::from_slice(&request.body).unwrap_or(Value::Null))
            .collect()
    }

    /// Value of a header on the first request received
    pub async fn first_request_header(&self, name: &str) -> Option<String> {
        let requests = self.server.received_requests().await.unwrap_or_default();
        let request = requests.first()?;
        request
            .headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    // =========================================================================
    // POST /chat/completions - OpenAI-compatible
    // =========================================================================

    /// Mock a streaming chat completion that delivers `contents` as deltas
    pub async fn mock_chat_stream(&self, contents: &[&str]) {
        self.mock_sse("/chat/completions", openai_sse(contents)).await;
    }

    /// Mock a non-streaming chat completion
    pub async fn mock_chat_completion(&self, content: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header_exists("Authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop"
                }]
            })))
            .mount(&self.server)
            .await;
    }

    // =========================================================================
    // Vendor-specific endpoints
    // =========================================================================

    /// Mock a Cohere v2 chat stream
    pub async fn mock_cohere_stream(&self, contents: &[&str]) {
        let mut body = String::from("event: message-start\ndata: {\"type\":\"message-start\"}\n\n");
        for content in contents {
            let event = json!({
                "type": "content-delta",
                "index": 0,
                "delta": { "message": { "content": { "text": content } } }
            });
            body.push_str(&format!("event: content-delta\ndata: {}\n\n", event));
        }
        body.push_str("event: message-end\ndata: {\"type\":\"message-end\"}\n\n");

        self.mock_sse("/chat", body).await;
    }

    /// Mock a Gemini streamGenerateContent response
    pub async fn mock_gemini_stream(&self, model: &str, contents: &[&str]) {
        let body: String = contents
            .iter()
            .map(|content| {
                let event = json!({
                    "candidates": [{
                        "content": { "role": "model", "parts": [{ "text": content }] }
                    }]
                });
                format!("data: {}\r\n\r\n", event)
            })
            .collect();

        Mock::given(method("POST"))
            .and(path(format!("/models/{}:streamGenerateContent", model)))
            .and(query_param("alt", "sse"))
            .and(header_exists("x-goog-api-key"))
            .respond_with(sse_response(body))
            .mount(&self.server)
            .await;
    }

    /// Mock an AI21 completion
    pub async fn mock_ai21_complete(&self, model: &str, text: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/{}/complete", model)))
            .and(header_exists("Authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "ai21-test",
                "completions": [{ "data": { "text": text }, "finishReason": { "reason": "endoftext" } }]
            })))
            .mount(&self.server)
            .await;
    }

    // =========================================================================
    // Raw bodies and errors
    // =========================================================================

    /// Mock an arbitrary SSE body at `endpoint`
    pub async fn mock_sse(&self, endpoint: &str, body: String) {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .and(header_exists("Authorization"))
            .respond_with(sse_response(body))
            .mount(&self.server)
            .await;
    }

    /// Mock an error status with a verbatim body for any method at `endpoint`
    pub async fn mock_error(&self, endpoint: &str, status: u16, body: &str) {
        Mock::given(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Mock a GET endpoint returning `body` as an event stream
    pub async fn mock_get_stream(&self, endpoint: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(sse_response(body.to_string()))
            .mount(&self.server)
            .await;
    }
}

fn sse_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("Content-Type", "text/event-stream")
        .insert_header("Cache-Control", "no-cache")
}

/// OpenAI-style SSE body: one delta chunk per content, then `[DONE]`
pub fn openai_sse(contents: &[&str]) -> String {
    let mut body = String::new();
    for content in contents {
        let chunk = json!({
            "id": "chatcmpl-test",
            "object": "chat.completion.chunk",
            "choices": [{ "index": 0, "delta": { "content": content }, "finish_reason": null }]
        });
        body.push_str(&format!("data: {}\n\n", chunk));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

/// Serve one event stream whose events are written `gap` apart
///
/// wiremock sends a body in one piece, so pacing needs a raw socket.
/// Returns the server's base URI.
pub async fn serve_paced_sse(body: String, gap: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind paced server");
    let addr = listener.local_addr().expect("paced server address");

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        read_request(&mut socket).await;

        let head = "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n";
        if socket.write_all(head.as_bytes()).await.is_err() {
            return;
        }
        for event in body.split_inclusive("\n\n") {
            tokio::time::sleep(gap).await;
            if socket.write_all(event.as_bytes()).await.is_err() {
                return;
            }
        }
        let _ = socket.shutdown().await;
    });

    format!("http://{}", addr)
}

/// Consume a request's head and `content-length` body
async fn read_request(socket: &mut TcpStream) {
    let mut received = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => received.extend_from_slice(&buf[..n]),
        }

        let Some(end) = received.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&received[..end]).to_lowercase();
        let length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if received.len() >= end + 4 + length {
            return;
        }
    }
}
