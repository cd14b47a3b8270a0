//! Per-line payload classification and content extraction
//!
//! A complete line is either SSE framing, the `[DONE]` sentinel, a JSON
//! object carrying (or not carrying) content, or raw text. Vendors differ only
//! in where the content sits inside the JSON object, which is captured by
//! [`PayloadFormat`].

use serde_json::Value;
use tracing::debug;

use crate::error::MalformedPayload;
use crate::metrics::record_malformed_line;

/// End-of-stream sentinel sent by OpenAI-compatible vendors
pub const DONE_SENTINEL: &str = "[DONE]";

/// Where content lives inside a structured payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadFormat {
    /// Chat delta content, then plain text, then nested completion text
    #[default]
    Generic,
    /// Cohere v2 chat stream (`delta.message.content.text`), then `Generic`
    Cohere,
    /// Gemini `streamGenerateContent` (`candidates[0].content.parts[*].text`), then `Generic`
    Gemini,
}

impl PayloadFormat {
    /// Whether SSE field lines other than `data:` are envelope for this format.
    ///
    /// Generic streams may be plain text, where a line such as `id: 5` is
    /// content, so only vendors known to send full SSE framing skip them.
    fn skips_sse_fields(self) -> bool {
        matches!(self, PayloadFormat::Cohere | PayloadFormat::Gemini)
    }

    /// Extract the content carried by a structured payload, if any.
    pub fn extract(self, value: &Value) -> Option<String> {
        let specific = match self {
            PayloadFormat::Generic => None,
            PayloadFormat::Cohere => non_empty(value.pointer("/delta/message/content/text"))
                .map(str::to_string),
            PayloadFormat::Gemini => gemini_text(value),
        };
        specific.or_else(|| generic_text(value))
    }
}

/// Classification of one complete line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Content fragment to emit (already unescaped)
    Content(String),
    /// Nothing to emit: framing, blank line, or a payload without content
    Skip,
    /// End-of-stream sentinel
    Done,
    /// The vendor reported an error inside the stream
    Failure(String),
}

/// Process one line as received from the stream.
///
/// `terminated` is true when the line ended with a newline. A raw text line
/// without `data:` framing gets its newline back, since that newline belonged
/// to the content rather than to the envelope.
pub fn process_line(line: &str, terminated: bool, format: PayloadFormat) -> LineOutcome {
    let line = line.strip_suffix('\r').unwrap_or(line);

    if line.trim().is_empty() {
        return LineOutcome::Skip;
    }
    if format.skips_sse_fields() && is_sse_field(line) {
        return LineOutcome::Skip;
    }

    let (payload, framed) = match strip_data_prefix(line) {
        Some(payload) => (payload, true),
        None => (line, false),
    };

    if payload.trim().is_empty() {
        return LineOutcome::Skip;
    }
    if payload.trim() == DONE_SENTINEL {
        return LineOutcome::Done;
    }

    match parse_object(payload) {
        Ok(value) => match format.extract(&value) {
            Some(content) => LineOutcome::Content(unescape_newlines(&content)),
            None => match error_message(&value) {
                Some(message) => LineOutcome::Failure(message),
                None => LineOutcome::Skip,
            },
        },
        Err(e) => {
            debug!(error = %e, framed, "Treating unparseable line as raw content");
            record_malformed_line();

            let mut raw = payload.to_string();
            if terminated && !framed {
                raw.push('\n');
            }
            LineOutcome::Content(unescape_newlines(&raw))
        }
    }
}

/// Rewrite every literal backslash-n sequence into a real line break.
///
/// Several vendors double-escape newlines inside otherwise valid JSON.
pub fn unescape_newlines(content: &str) -> String {
    content.replace("\\n", "\n")
}

/// Strip an SSE `data:` field name and its single optional leading space
fn strip_data_prefix(line: &str) -> Option<&str> {
    line.strip_prefix("data:")
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
}

fn is_sse_field(line: &str) -> bool {
    line.starts_with(':')
        || line.starts_with("event:")
        || line.starts_with("id:")
        || line.starts_with("retry:")
}

fn parse_object(payload: &str) -> Result<Value, MalformedPayload> {
    let value: Value =
        serde_json::from_str(payload.trim()).map_err(|e| MalformedPayload(e.to_string()))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(MalformedPayload("payload is not a JSON object".to_string()))
    }
}

fn non_empty(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn generic_text(value: &Value) -> Option<String> {
    non_empty(value.pointer("/choices/0/delta/content"))
        .or_else(|| non_empty(value.pointer("/choices/0/text")))
        .or_else(|| non_empty(value.get("text")))
        .or_else(|| non_empty(value.pointer("/completions/0/data/text")))
        .map(str::to_string)
}

fn gemini_text(value: &Value) -> Option<String> {
    let parts = value.pointer("/candidates/0/content/parts")?.as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    (!text.is_empty()).then_some(text)
}

fn error_message(value: &Value) -> Option<String> {
    let error = value.get("error")?;
    match error {
        Value::String(message) => Some(message.clone()),
        Value::Object(_) => Some(
            error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string()),
        ),
        _ => None,
    }
}
