//! Vendor providers
//!
//! Defines the [`Provider`] trait and one implementation per vendor API
//! family. Every provider issues exactly one outbound call per `submit` and
//! hands the response back as a [`FragmentStream`].

mod ai21;
mod cohere;
mod gemini;
mod openai_compat;
mod vendor;

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{error, info, warn};

pub use ai21::Ai21Provider;
pub use cohere::CohereProvider;
pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatibleProvider;
pub use vendor::Vendor;

use crate::config::Config;
use crate::error::{CodegenError, Result};
use crate::metrics::{record_fragment, record_request};
use crate::streaming::{error_body, FragmentStream};
use crate::types::{ChatCompletionRequest, Message, ModelId, Role};

/// Instruction prepended to every conversation
pub const CODE_INSTRUCTION: &str = "You are a code generation assistant. Generate properly formatted code with appropriate line breaks and indentation. Do not include markdown formatting, backticks, or language indicators. Each line of code should be on its own line with proper newline characters.";

const SHADCN_INSTRUCTION: &str = "You may use shadcn/ui components, imported from \"@/components/ui\", where they fit the request.";

/// Trait implemented by every vendor adapter
///
/// Implementations hold only immutable configuration, so one instance can
/// serve concurrent requests without locking.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Vendor this provider talks to
    fn vendor(&self) -> Vendor;

    /// Issue the request and return its content fragments.
    ///
    /// Fails before any fragment is produced when the vendor rejects the
    /// request. Failures after that point arrive as the stream's final item.
    async fn submit(&self, request: &ChatCompletionRequest) -> Result<FragmentStream>;
}

/// Construct the provider for a vendor.
///
/// Credentials are checked here, so a missing key fails before any network call.
pub fn build_provider(
    vendor: Vendor,
    client: reqwest::Client,
    config: &Config,
) -> Result<Arc<dyn Provider>> {
    let provider: Arc<dyn Provider> = match vendor {
        Vendor::Ai21 => Arc::new(Ai21Provider::new(client, config)?),
        Vendor::Cohere => Arc::new(CohereProvider::new(client, config)?),
        Vendor::Gemini => Arc::new(GeminiProvider::new(client, config)?),
        _ => Arc::new(OpenAiCompatibleProvider::new(vendor, client, config)?),
    };
    Ok(provider)
}

/// System instruction text, with the shadcn/ui allowance when requested
pub fn system_instruction(shadcn: bool) -> String {
    if shadcn {
        format!("{} {}", CODE_INSTRUCTION, SHADCN_INSTRUCTION)
    } else {
        CODE_INSTRUCTION.to_string()
    }
}

/// Conversation as sent upstream: the system instruction first, then the
/// caller's messages in order. `user_suffix` is appended to user messages
/// for vendors that need the reminder repeated.
pub(crate) fn prepare_messages(
    request: &ChatCompletionRequest,
    user_suffix: Option<&str>,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    messages.push(Message::system(system_instruction(request.shadcn)));

    messages.extend(request.messages.iter().map(|message| match (message.role, user_suffix) {
        (Role::User, Some(suffix)) => Message::user(format!("{}{}", message.content, suffix)),
        _ => message.clone(),
    }));

    messages
}

/// Vendor-side model name for a request
pub(crate) fn vendor_model(vendor: Vendor, request: &ChatCompletionRequest) -> Result<String> {
    let id = ModelId::parse(&request.model)?;
    Ok(vendor.map_model(&id.model))
}

/// Reject non-success vendor responses, carrying the body verbatim
pub(crate) async fn ensure_success(
    vendor: Vendor,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = error_body(response).await;
    warn!(vendor = %vendor, status = %status, "Vendor returned an error status");
    record_request(vendor.as_str(), "vendor_error");
    Err(CodegenError::VendorApi {
        vendor: vendor.as_str(),
        status: status.as_u16(),
        message,
    })
}

/// Count a request that failed before any response arrived
pub(crate) fn send_failed(vendor: Vendor, error: reqwest::Error) -> CodegenError {
    error!(vendor = %vendor, error = %error, "Failed to send request to vendor");
    record_request(vendor.as_str(), "transport_error");
    CodegenError::Transport(error)
}

/// Wrap a fragment stream with per-vendor metrics and a completion log line
pub(crate) fn track(vendor: Vendor, fragments: FragmentStream) -> FragmentStream {
    Box::pin(async_stream::stream! {
        let mut fragments = fragments;
        let mut count = 0usize;

        while let Some(item) = fragments.next().await {
            match item {
                Ok(fragment) => {
                    count += 1;
                    record_fragment(vendor.as_str());
                    yield Ok(fragment);
                }
                Err(e) => {
                    warn!(vendor = %vendor, fragments = count, error = %e, "Vendor stream failed");
                    record_request(vendor.as_str(), e.code());
                    yield Err(e);
                    return;
                }
            }
        }

        info!(vendor = %vendor, fragments = count, "Vendor stream completed");
        record_request(vendor.as_str(), "success");
    })
}
