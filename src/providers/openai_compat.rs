//! OpenAI-compatible chat completions
//!
//! Most vendors expose `POST {base}/chat/completions` with the OpenAI request
//! and SSE response shapes. Vendor differences are limited to the endpoint,
//! a few extra headers or body parameters, and an optional reminder appended
//! to user messages.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument};

use super::{
    ensure_success, prepare_messages, send_failed, track, vendor_model, Provider, Vendor,
};
use crate::config::Config;
use crate::error::{CodegenError, Result};
use crate::streaming::{normalize, one_shot, unescape_newlines, FragmentStream, PayloadFormat};
use crate::types::ChatCompletionRequest;

const FORMATTED_CODE_REMINDER: &str =
    "\nPlease generate properly formatted code with line breaks and indentation. NO backticks or language names.";

const CODE_ONLY_REMINDER: &str = "\nPlease ONLY return code, NO backticks or language names.";

const HELICONE_BASE_URL: &str = "https://together.helicone.ai/v1";

/// Provider for every vendor speaking the OpenAI chat completions protocol
pub struct OpenAiCompatibleProvider {
    vendor: Vendor,
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    headers: Vec<(&'static str, String)>,
    user_suffix: Option<&'static str>,
    extra_body: Map<String, Value>,
    default_temperature: f64,
    max_tokens: u32,
}

impl OpenAiCompatibleProvider {
    /// Create a provider, failing if a required variable is missing
    pub fn new(vendor: Vendor, client: reqwest::Client, config: &Config) -> Result<Self> {
        let api_key = config.require(vendor.as_str(), vendor.credential())?.to_string();
        let mut headers = Vec::new();

        let base_url = match vendor {
            Vendor::Cerebrium => cerebrium_base_url(config)?,
            Vendor::Together => match config.var("HELICONE_API_KEY") {
                Some(helicone_key) if config.var("TOGETHER_BASE_URL").is_none() => {
                    headers.push(("Helicone-Auth", format!("Bearer {}", helicone_key)));
                    HELICONE_BASE_URL.to_string()
                }
                _ => vendor.base_url(config).unwrap_or_default(),
            },
            _ => vendor.base_url(config).unwrap_or_default(),
        };

        if vendor == Vendor::OpenRouter {
            headers.push(("HTTP-Referer", config.site_url.clone()));
            headers.push(("X-Title", config.app_name.clone()));
        }

        let user_suffix = match vendor {
            Vendor::Groq | Vendor::Mistral => Some(FORMATTED_CODE_REMINDER),
            Vendor::Together => Some(CODE_ONLY_REMINDER),
            _ => None,
        };

        Ok(Self {
            vendor,
            client,
            base_url,
            api_key,
            headers,
            user_suffix,
            extra_body: extra_body(vendor),
            default_temperature: config.default_temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn build_body(&self, model: &str, request: &ChatCompletionRequest) -> Value {
        let mut body = json!({
            "model": model,
            "messages": prepare_messages(request, self.user_suffix),
            "temperature": request.temperature.unwrap_or(self.default_temperature),
            "max_tokens": self.max_tokens,
            "stream": request.stream,
        });

        if let Some(object) = body.as_object_mut() {
            object.extend(self.extra_body.clone());
        }
        body
    }
}

/// Cerebrium endpoints are per project and deployment
fn cerebrium_base_url(config: &Config) -> Result<String> {
    if let Some(url) = Vendor::Cerebrium.base_url(config) {
        return Ok(url);
    }

    let project = config.require("cerebrium", "CEREBRIUM_PROJECT_ID")?;
    let endpoint = config.require("cerebrium", "CEREBRIUM_ENDPOINT_NAME")?;
    Ok(format!(
        "https://{}.{}.inference.ai.cerebrium.ai/v1",
        project, endpoint
    ))
}

/// Vendor-specific sampling parameters added to the request body
fn extra_body(vendor: Vendor) -> Map<String, Value> {
    let extra = match vendor {
        Vendor::Mistral => json!({ "top_p": 1, "safe_prompt": false }),
        Vendor::Groq => json!({ "frequency_penalty": 0, "presence_penalty": 0 }),
        Vendor::OpenRouter | Vendor::Fireworks => json!({ "top_p": 1 }),
        _ => json!({}),
    };

    match extra {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    fn vendor(&self) -> Vendor {
        self.vendor
    }

    #[instrument(
        skip(self, request),
        fields(vendor = %self.vendor, model = %request.model, request_id = %uuid::Uuid::new_v4())
    )]
    async fn submit(&self, request: &ChatCompletionRequest) -> Result<FragmentStream> {
        let model = vendor_model(self.vendor, request)?;
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_body(&model, request);

        info!(url = %url, model = %model, stream = request.stream, "Submitting chat completion");

        let mut builder = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body);
        for (name, value) in &self.headers {
            builder = builder.header(*name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| send_failed(self.vendor, e))?;
        let response = ensure_success(self.vendor, response).await?;

        if request.stream {
            debug!(status = %response.status(), "Streaming vendor response");
            return Ok(track(
                self.vendor,
                normalize(response.bytes_stream(), PayloadFormat::Generic),
            ));
        }

        let value: Value = response.json().await?;
        let text = value
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| CodegenError::UnexpectedResponse {
                vendor: self.vendor.as_str(),
                message: "missing choices[0].message.content".to_string(),
            })?;

        Ok(track(self.vendor, one_shot(unescape_newlines(text))))
    }
}
