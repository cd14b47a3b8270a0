//! Cohere v2 chat

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use super::{
    ensure_success, prepare_messages, send_failed, track, vendor_model, Provider, Vendor,
};
use crate::config::Config;
use crate::error::{CodegenError, Result};
use crate::streaming::{normalize, one_shot, unescape_newlines, FragmentStream, PayloadFormat};
use crate::types::ChatCompletionRequest;

/// Provider for Cohere's v2 chat endpoint
///
/// Streaming responses are full SSE (`event:` plus `data:` lines) with the
/// text under `delta.message.content.text`.
pub struct CohereProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    default_temperature: f64,
    max_tokens: u32,
}

impl CohereProvider {
    pub fn new(client: reqwest::Client, config: &Config) -> Result<Self> {
        let api_key = config
            .require(Vendor::Cohere.as_str(), Vendor::Cohere.credential())?
            .to_string();

        Ok(Self {
            client,
            base_url: Vendor::Cohere.base_url(config).unwrap_or_default(),
            api_key,
            default_temperature: config.default_temperature,
            max_tokens: config.max_tokens,
        })
    }
}

/// Text of a non-streaming v2 response: `message.content[*].text`
fn response_text(value: &Value) -> Option<String> {
    let parts = value.pointer("/message/content")?.as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    Some(text)
}

#[async_trait]
impl Provider for CohereProvider {
    fn vendor(&self) -> Vendor {
        Vendor::Cohere
    }

    #[instrument(
        skip(self, request),
        fields(vendor = "cohere", model = %request.model, request_id = %uuid::Uuid::new_v4())
    )]
    async fn submit(&self, request: &ChatCompletionRequest) -> Result<FragmentStream> {
        let model = vendor_model(Vendor::Cohere, request)?;
        let url = format!("{}/chat", self.base_url);
        let body = json!({
            "model": model,
            "messages": prepare_messages(request, None),
            "temperature": request.temperature.unwrap_or(self.default_temperature),
            "max_tokens": self.max_tokens,
            "stream": request.stream,
        });

        info!(url = %url, model = %model, stream = request.stream, "Submitting chat");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| send_failed(Vendor::Cohere, e))?;
        let response = ensure_success(Vendor::Cohere, response).await?;

        if request.stream {
            debug!("Streaming Cohere response");
            return Ok(track(
                Vendor::Cohere,
                normalize(response.bytes_stream(), PayloadFormat::Cohere),
            ));
        }

        let value: Value = response.json().await?;
        let text = response_text(&value).ok_or_else(|| CodegenError::UnexpectedResponse {
            vendor: Vendor::Cohere.as_str(),
            message: "missing message.content".to_string(),
        })?;

        Ok(track(Vendor::Cohere, one_shot(unescape_newlines(&text))))
    }
}
