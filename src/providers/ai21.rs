//! AI21 Jurassic completions
//!
//! AI21 has no incremental mode: the conversation is rendered as a prompt,
//! one completion is requested and its text is delivered as a single fragment.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{
    ensure_success, prepare_messages, send_failed, track, vendor_model, Provider, Vendor,
};
use crate::config::Config;
use crate::error::{CodegenError, Result};
use crate::streaming::{one_shot, unescape_newlines, FragmentStream};
use crate::types::ChatCompletionRequest;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompleteRequest {
    prompt: String,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
}

#[derive(Debug, Deserialize)]
struct CompleteResponse {
    #[serde(default)]
    completions: Vec<Completion>,
}

#[derive(Debug, Deserialize)]
struct Completion {
    data: CompletionData,
}

#[derive(Debug, Deserialize)]
struct CompletionData {
    text: String,
}

/// Provider for the AI21 `complete` endpoint
pub struct Ai21Provider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    default_temperature: f64,
    max_tokens: u32,
}

impl Ai21Provider {
    pub fn new(client: reqwest::Client, config: &Config) -> Result<Self> {
        let api_key = config
            .require(Vendor::Ai21.as_str(), Vendor::Ai21.credential())?
            .to_string();

        Ok(Self {
            client,
            base_url: Vendor::Ai21.base_url(config).unwrap_or_default(),
            api_key,
            default_temperature: config.default_temperature,
            max_tokens: config.max_tokens,
        })
    }
}

/// Render the conversation as `role: content` lines
fn render_prompt(request: &ChatCompletionRequest) -> String {
    prepare_messages(request, None)
        .iter()
        .map(|message| format!("{}: {}", message.role, message.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Provider for Ai21Provider {
    fn vendor(&self) -> Vendor {
        Vendor::Ai21
    }

    #[instrument(
        skip(self, request),
        fields(vendor = "ai21", model = %request.model, request_id = %uuid::Uuid::new_v4())
    )]
    async fn submit(&self, request: &ChatCompletionRequest) -> Result<FragmentStream> {
        let model = vendor_model(Vendor::Ai21, request)?;
        let url = format!("{}/{}/complete", self.base_url, model);
        let body = CompleteRequest {
            prompt: render_prompt(request),
            max_tokens: self.max_tokens,
            temperature: request.temperature.unwrap_or(self.default_temperature),
            top_p: 1.0,
        };

        info!(url = %url, model = %model, "Submitting completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| send_failed(Vendor::Ai21, e))?;
        let response = ensure_success(Vendor::Ai21, response).await?;

        let parsed: CompleteResponse = response.json().await?;
        let text = parsed
            .completions
            .into_iter()
            .next()
            .map(|completion| completion.data.text)
            .ok_or_else(|| CodegenError::UnexpectedResponse {
                vendor: Vendor::Ai21.as_str(),
                message: "response contained no completions".to_string(),
            })?;

        Ok(track(Vendor::Ai21, one_shot(unescape_newlines(&text))))
    }
}
