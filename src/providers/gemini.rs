//! Google Gemini generateContent

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use super::{
    ensure_success, prepare_messages, send_failed, track, vendor_model, Provider, Vendor,
};
use crate::config::Config;
use crate::error::{CodegenError, Result};
use crate::streaming::{normalize, one_shot, unescape_newlines, FragmentStream, PayloadFormat};
use crate::types::{ChatCompletionRequest, Role};

/// Provider for the Gemini `generateContent` family
///
/// System messages are folded into `systemInstruction`; the remaining turns
/// become `contents` with the assistant role renamed to `model`.
pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    default_temperature: f64,
    max_tokens: u32,
}

impl GeminiProvider {
    pub fn new(client: reqwest::Client, config: &Config) -> Result<Self> {
        let api_key = config
            .require(Vendor::Gemini.as_str(), Vendor::Gemini.credential())?
            .to_string();

        Ok(Self {
            client,
            base_url: Vendor::Gemini.base_url(config).unwrap_or_default(),
            api_key,
            default_temperature: config.default_temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn build_body(&self, request: &ChatCompletionRequest) -> Value {
        let messages = prepare_messages(request, None);

        let system = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let contents: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                let role = match m.role {
                    Role::Assistant => "model",
                    _ => "user",
                };
                json!({ "role": role, "parts": [{ "text": m.content }] })
            })
            .collect();

        json!({
            "systemInstruction": { "parts": [{ "text": system }] },
            "contents": contents,
            "generationConfig": {
                "temperature": request.temperature.unwrap_or(self.default_temperature),
                "maxOutputTokens": self.max_tokens,
                "candidateCount": 1,
            },
        })
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn vendor(&self) -> Vendor {
        Vendor::Gemini
    }

    #[instrument(
        skip(self, request),
        fields(vendor = "gemini", model = %request.model, request_id = %uuid::Uuid::new_v4())
    )]
    async fn submit(&self, request: &ChatCompletionRequest) -> Result<FragmentStream> {
        let model = vendor_model(Vendor::Gemini, request)?;
        let url = if request.stream {
            format!("{}/models/{}:streamGenerateContent?alt=sse", self.base_url, model)
        } else {
            format!("{}/models/{}:generateContent", self.base_url, model)
        };

        info!(url = %url, model = %model, stream = request.stream, "Submitting generateContent");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.build_body(request))
            .send()
            .await
            .map_err(|e| send_failed(Vendor::Gemini, e))?;
        let response = ensure_success(Vendor::Gemini, response).await?;

        if request.stream {
            debug!("Streaming Gemini response");
            return Ok(track(
                Vendor::Gemini,
                normalize(response.bytes_stream(), PayloadFormat::Gemini),
            ));
        }

        let value: Value = response.json().await?;
        let text = PayloadFormat::Gemini
            .extract(&value)
            .ok_or_else(|| CodegenError::UnexpectedResponse {
                vendor: Vendor::Gemini.as_str(),
                message: "missing candidates[0].content.parts".to_string(),
            })?;

        Ok(track(Vendor::Gemini, one_shot(unescape_newlines(&text))))
    }
}
