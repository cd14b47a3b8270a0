//! Vendor catalog
//!
//! Everything that differs between vendors and is pure data lives here:
//! names, credential variables, default endpoints and model-name tables.

use std::collections::HashMap;
use std::str::FromStr;

use once_cell::sync::Lazy;

use crate::config::Config;
use crate::error::{CodegenError, Result};

/// Supported text-generation vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    Together,
    OpenAi,
    Groq,
    Mistral,
    Ai21,
    Gemini,
    Cohere,
    OpenRouter,
    Fireworks,
    Glhf,
    SambaNova,
    Upstage,
    EdenAi,
    Cerebrium,
    Deepseek,
    Hyperbolic,
}

/// Static description of one vendor
struct VendorProfile {
    name: &'static str,
    credential: &'static str,
    base_url_var: &'static str,
    default_base_url: &'static str,
    models: &'static [(&'static str, &'static str)],
}

const TOGETHER: VendorProfile = VendorProfile {
    name: "together",
    credential: "TOGETHER_API_KEY",
    base_url_var: "TOGETHER_BASE_URL",
    default_base_url: "https://api.together.xyz/v1",
    models: &[],
};

const OPENAI: VendorProfile = VendorProfile {
    name: "openai",
    credential: "OPENAI_API_KEY",
    base_url_var: "OPENAI_BASE_URL",
    default_base_url: "https://api.openai.com/v1",
    models: &[
        ("gpt-4-turbo", "gpt-4-1106-preview"),
        ("gpt-4", "gpt-4"),
        ("gpt-3.5-turbo", "gpt-3.5-turbo"),
    ],
};

const GROQ: VendorProfile = VendorProfile {
    name: "groq",
    credential: "GROQ_API_KEY",
    base_url_var: "GROQ_BASE_URL",
    default_base_url: "https://api.groq.com/openai/v1",
    models: &[
        ("llama2-70b", "llama2-70b-4096"),
        ("mixtral-8x7b", "mixtral-8x7b-32768"),
        ("gemma-7b", "gemma-7b-it"),
    ],
};

const MISTRAL: VendorProfile = VendorProfile {
    name: "mistral",
    credential: "MISTRAL_API_KEY",
    base_url_var: "MISTRAL_BASE_URL",
    default_base_url: "https://api.mistral.ai/v1",
    models: &[
        ("mistral-tiny", "mistral-tiny-latest"),
        ("mistral-small", "mistral-small-latest"),
        ("mistral-medium", "mistral-medium-latest"),
        ("mistral-large", "mistral-large-latest"),
    ],
};

const AI21: VendorProfile = VendorProfile {
    name: "ai21",
    credential: "AI21_API_KEY",
    base_url_var: "AI21_BASE_URL",
    default_base_url: "https://api.ai21.com/studio/v1",
    models: &[
        ("j2-ultra", "j2-ultra"),
        ("j2-mid", "j2-mid"),
        ("j2-light", "j2-light"),
    ],
};

const GEMINI: VendorProfile = VendorProfile {
    name: "gemini",
    credential: "GOOGLE_GENERATIVE_AI_API_KEY",
    base_url_var: "GOOGLE_GENERATIVE_AI_BASE_URL",
    default_base_url: "https://generativelanguage.googleapis.com/v1beta",
    models: &[
        ("gemini-pro", "gemini-1.5-pro"),
        ("gemini-pro-vision", "gemini-1.5-pro-vision"),
        ("gemini-ultra", "gemini-1.5-ultra"),
    ],
};

const COHERE: VendorProfile = VendorProfile {
    name: "cohere",
    credential: "COHERE_API_KEY",
    base_url_var: "COHERE_BASE_URL",
    default_base_url: "https://api.cohere.com/v2",
    models: &[
        ("command", "command"),
        ("command-light", "command-light"),
        ("command-r", "command-r"),
        ("command-r-light", "command-r-light"),
        ("command-nightly", "command-nightly"),
        ("command-light-nightly", "command-light-nightly"),
    ],
};

const OPENROUTER: VendorProfile = VendorProfile {
    name: "openrouter",
    credential: "OPEN_ROUTER_API_KEY",
    base_url_var: "OPEN_ROUTER_BASE_URL",
    default_base_url: "https://openrouter.ai/api/v1",
    models: &[
        ("gpt-3.5-turbo", "openai/gpt-3.5-turbo"),
        ("gpt-4", "openai/gpt-4"),
        ("claude-2", "anthropic/claude-2"),
        ("claude-instant", "anthropic/claude-instant"),
        ("palm-2", "google/palm-2"),
        ("command-light", "cohere/command-light"),
        ("command", "cohere/command"),
        ("llama-2-70b", "meta-llama/llama-2-70b"),
        ("llama-2-13b", "meta-llama/llama-2-13b"),
        ("llama-2-7b", "meta-llama/llama-2-7b"),
    ],
};

const FIREWORKS: VendorProfile = VendorProfile {
    name: "fireworks",
    credential: "FIREWORKS_API_KEY",
    base_url_var: "FIREWORKS_BASE_URL",
    default_base_url: "https://api.fireworks.ai/inference/v1",
    models: &[
        ("llama-v2-7b", "accounts/fireworks/models/llama-v2-7b-chat"),
        ("llama-v2-13b", "accounts/fireworks/models/llama-v2-13b-chat"),
        ("llama-v2-70b", "accounts/fireworks/models/llama-v2-70b-chat"),
        ("mistral-7b", "accounts/fireworks/models/mistral-7b-instruct"),
        ("mixtral-8x7b", "accounts/fireworks/models/mixtral-8x7b-instruct"),
        ("zephyr-7b", "accounts/fireworks/models/zephyr-7b-beta"),
        ("qwen-72b", "accounts/fireworks/models/qwen-72b-chat"),
    ],
};

const GLHF: VendorProfile = VendorProfile {
    name: "glhf",
    credential: "GLHF_API_KEY",
    base_url_var: "GLHF_BASE_URL",
    default_base_url: "https://glhf.chat/api/openai/v1",
    models: &[
        ("mistral-7b", "hf:mistralai/Mistral-7B-Instruct-v0.3"),
        ("llama-2-7b", "hf:meta-llama/Llama-2-7b-chat-hf"),
        ("llama-2-13b", "hf:meta-llama/Llama-2-13b-chat-hf"),
        ("llama-2-70b", "hf:meta-llama/Llama-2-70b-chat-hf"),
        ("codellama-34b", "hf:codellama/CodeLlama-34b-Instruct-hf"),
        ("mixtral-8x7b", "hf:mistralai/Mixtral-8x7B-Instruct-v0.1"),
    ],
};

const SAMBANOVA: VendorProfile = VendorProfile {
    name: "sambanova",
    credential: "SAMBANOVA_API_KEY",
    base_url_var: "SAMBANOVA_BASE_URL",
    default_base_url: "https://api.sambanova.ai/v1",
    models: &[],
};

const UPSTAGE: VendorProfile = VendorProfile {
    name: "upstage",
    credential: "UPSTAGE_API_KEY",
    base_url_var: "UPSTAGE_BASE_URL",
    default_base_url: "https://api.upstage.ai/v1",
    models: &[
        ("solar-0-70b", "upstage/solar-0-70b-16bit"),
        ("starling-lm-7b", "upstage/starling-lm-7b-alpha"),
        ("nous-hermes-llama2-70b", "upstage/nous-hermes-llama2-70b"),
        ("platypus2-70b", "upstage/platypus2-70b-instruct"),
        ("starling-lm-alpha", "upstage/starling-lm-alpha"),
    ],
};

const EDENAI: VendorProfile = VendorProfile {
    name: "edenai",
    credential: "EDENAI_API_KEY",
    base_url_var: "EDENAI_BASE_URL",
    default_base_url: "https://api.edenai.run/v2",
    models: &[
        ("gpt-4", "openai/gpt-4"),
        ("gpt-3.5-turbo", "openai/gpt-3.5-turbo"),
        ("claude-2", "anthropic/claude-2"),
        ("command", "cohere/command"),
        ("palm-2", "google/palm-2"),
    ],
};

// Cerebrium's endpoint is built from the project id and endpoint name
const CEREBRIUM: VendorProfile = VendorProfile {
    name: "cerebrium",
    credential: "CEREBRIUM_API_KEY",
    base_url_var: "CEREBRIUM_BASE_URL",
    default_base_url: "",
    models: &[
        ("llama-2-70b", "meta-llama/llama-2-70b-chat"),
        ("llama-2-13b", "meta-llama/llama-2-13b-chat"),
        ("llama-2-7b", "meta-llama/llama-2-7b-chat"),
        ("codellama-34b", "codellama/codellama-34b-instruct"),
        ("mixtral-8x7b", "mistralai/mixtral-8x7b-instruct"),
    ],
};

const DEEPSEEK: VendorProfile = VendorProfile {
    name: "deepseek",
    credential: "DEEPSEEK_API_KEY",
    base_url_var: "DEEPSEEK_BASE_URL",
    default_base_url: "https://api.deepseek.com/v1",
    models: &[
        ("deepseek-coder-33b", "deepseek-ai/deepseek-coder-33b-instruct"),
        ("deepseek-coder-6.7b", "deepseek-ai/deepseek-coder-6.7b-instruct"),
        ("deepseek-chat-67b", "deepseek-ai/deepseek-chat-67b"),
        ("deepseek-chat-7b", "deepseek-ai/deepseek-chat-7b"),
    ],
};

const HYPERBOLIC: VendorProfile = VendorProfile {
    name: "hyperbolic",
    credential: "HYPERBOLIC_API_KEY",
    base_url_var: "HYPERBOLIC_BASE_URL",
    default_base_url: "https://api.hyperbolic.ai/v1",
    models: &[
        ("mixtral-8x7b", "mistralai/mixtral-8x7b-instruct"),
        ("mistral-7b", "mistralai/mistral-7b-instruct"),
        ("llama-2-70b", "meta-llama/llama-2-70b-chat"),
        ("llama-2-13b", "meta-llama/llama-2-13b-chat"),
        ("codellama-34b", "codellama/codellama-34b-instruct"),
    ],
};

/// Model-name lookup tables, built once from the static profiles
static MODEL_TABLES: Lazy<HashMap<Vendor, HashMap<&'static str, &'static str>>> = Lazy::new(|| {
    Vendor::ALL
        .iter()
        .map(|vendor| (*vendor, vendor.profile().models.iter().copied().collect()))
        .collect()
});

impl Vendor {
    /// Every supported vendor
    pub const ALL: [Vendor; 16] = [
        Vendor::Together,
        Vendor::OpenAi,
        Vendor::Groq,
        Vendor::Mistral,
        Vendor::Ai21,
        Vendor::Gemini,
        Vendor::Cohere,
        Vendor::OpenRouter,
        Vendor::Fireworks,
        Vendor::Glhf,
        Vendor::SambaNova,
        Vendor::Upstage,
        Vendor::EdenAi,
        Vendor::Cerebrium,
        Vendor::Deepseek,
        Vendor::Hyperbolic,
    ];

    fn profile(&self) -> &'static VendorProfile {
        match self {
            Vendor::Together => &TOGETHER,
            Vendor::OpenAi => &OPENAI,
            Vendor::Groq => &GROQ,
            Vendor::Mistral => &MISTRAL,
            Vendor::Ai21 => &AI21,
            Vendor::Gemini => &GEMINI,
            Vendor::Cohere => &COHERE,
            Vendor::OpenRouter => &OPENROUTER,
            Vendor::Fireworks => &FIREWORKS,
            Vendor::Glhf => &GLHF,
            Vendor::SambaNova => &SAMBANOVA,
            Vendor::Upstage => &UPSTAGE,
            Vendor::EdenAi => &EDENAI,
            Vendor::Cerebrium => &CEREBRIUM,
            Vendor::Deepseek => &DEEPSEEK,
            Vendor::Hyperbolic => &HYPERBOLIC,
        }
    }

    /// Vendor prefix used in composite model identifiers
    pub fn as_str(&self) -> &'static str {
        self.profile().name
    }

    /// Environment variable holding the vendor API key
    pub fn credential(&self) -> &'static str {
        self.profile().credential
    }

    /// Resolve the API base URL: `<VENDOR>_BASE_URL` override, else the vendor default
    pub fn base_url(&self, config: &Config) -> Option<String> {
        let profile = self.profile();
        let url = config
            .var(profile.base_url_var)
            .unwrap_or(profile.default_base_url);
        (!url.is_empty()).then(|| url.trim_end_matches('/').to_string())
    }

    /// Map a model name through the vendor table.
    ///
    /// Names missing from the table pass through unchanged.
    pub fn map_model(&self, model: &str) -> String {
        let mapped = MODEL_TABLES
            .get(self)
            .and_then(|table| table.get(model))
            .copied()
            .unwrap_or(model);

        match self {
            Vendor::Glhf if !mapped.starts_with("hf:") => format!("hf:{}", mapped),
            _ => mapped.to_string(),
        }
    }
}

impl FromStr for Vendor {
    type Err = CodegenError;

    fn from_str(name: &str) -> Result<Self> {
        Vendor::ALL
            .iter()
            .find(|vendor| vendor.as_str() == name)
            .copied()
            .ok_or_else(|| CodegenError::UnknownVendor(name.to_string()))
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
