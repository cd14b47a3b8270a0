//! Core request types
//!
//! Defines the chat messages and the generation request accepted by every
//! provider.

use serde::{Deserialize, Serialize};

use crate::error::{CodegenError, Result};

/// Role of a message participant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message providing instructions or context
    System,
    /// User message from the human
    User,
    /// Assistant message from the AI
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chat message with role and content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

fn default_stream() -> bool {
    true
}

/// Code generation request
///
/// Deserializes from the body `{model, messages[], temperature?, shadcn?}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionRequest {
    /// Composite model identifier, `vendor/model`
    pub model: String,
    /// Conversation, in order
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Whether incremental delivery is requested
    #[serde(default = "default_stream")]
    pub stream: bool,
    /// Allow shadcn/ui components in generated code
    #[serde(default)]
    pub shadcn: bool,
}

impl ChatCompletionRequest {
    /// Create a streaming request
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            stream: true,
            shadcn: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_shadcn(mut self, shadcn: bool) -> Self {
        self.shadcn = shadcn;
        self
    }
}

/// Composite model identifier split into vendor and vendor-side model name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelId {
    pub vendor: String,
    pub model: String,
}

impl ModelId {
    /// Split `vendor/model` on the first separator.
    ///
    /// The model half may itself contain separators (`openrouter/openai/gpt-4`).
    pub fn parse(identifier: &str) -> Result<Self> {
        match identifier.split_once('/') {
            Some((vendor, model)) if !vendor.is_empty() && !model.is_empty() => Ok(Self {
                vendor: vendor.to_string(),
                model: model.to_string(),
            }),
            _ => Err(CodegenError::InvalidIdentifier(identifier.to_string())),
        }
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.vendor, self.model)
    }
}
