//! SSE encoding of normalized fragments
//!
//! Formats fragments in the line-oriented envelope that [`StreamHandler`]
//! consumes, so a relay can forward normalized output without inventing its
//! own framing.
//!
//! [`StreamHandler`]: super::StreamHandler

use bytes::Bytes;
use serde_json::json;

use crate::error::CodegenError;

/// Format a content fragment as an SSE data event.
///
/// Wraps the fragment in a chat-delta object: `data: {json}\n\n`
pub fn format_fragment(content: &str) -> Bytes {
    let event = json!({
        "choices": [{ "delta": { "content": content } }]
    });
    Bytes::from(format!("data: {}\n\n", event))
}

/// Format the SSE done marker: `data: [DONE]\n\n`
pub fn format_done() -> Bytes {
    Bytes::from_static(b"data: [DONE]\n\n")
}

/// Format an error as an SSE error event.
///
/// This allows clients to receive error information before the stream closes.
pub fn format_error_event(error: &CodegenError) -> Bytes {
    let event = json!({
        "error": {
            "message": error.to_string(),
            "type": "stream_error",
            "code": error.code(),
        }
    });
    Bytes::from(format!("data: {}\n\n", event))
}
