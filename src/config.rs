//! Configuration management for Codestream
//!
//! Configuration is loaded from environment variables. Vendor credentials and
//! base-URL overrides are captured once into an immutable snapshot so providers
//! never read the process environment after construction.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::env;

use crate::error::CodegenError;

/// Suffixes of environment variables captured into the snapshot
const CAPTURED_SUFFIXES: &[&str] = &["_API_KEY", "_BASE_URL", "_PROJECT_ID", "_ENDPOINT_NAME"];

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Longest wait for the next bytes of a vendor response (in seconds)
    ///
    /// Applies per read, not to the whole request: a stream that keeps
    /// delivering is never cut off, one that stalls this long fails as a
    /// transport error.
    pub request_timeout_secs: u64,
    /// Temperature used when a request does not carry one
    pub default_temperature: f64,
    /// Completion token cap sent to vendors that accept one
    pub max_tokens: u32,
    /// Application name reported to vendors that ask for it (OpenRouter)
    pub app_name: String,
    /// Site URL reported to vendors that ask for it (OpenRouter)
    pub site_url: String,

    /// Captured credentials and endpoint variables
    vars: HashMap<String, String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(env::vars())
    }

    /// Build configuration from an explicit set of variables
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let lookup = |key: &str, default: &str| -> String {
            vars.get(key)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        let request_timeout_secs = lookup("CODESTREAM_REQUEST_TIMEOUT_SECS", "300")
            .parse()
            .context("Invalid CODESTREAM_REQUEST_TIMEOUT_SECS")?;
        let default_temperature = lookup("CODESTREAM_TEMPERATURE", "0.2")
            .parse()
            .context("Invalid CODESTREAM_TEMPERATURE")?;
        let max_tokens = lookup("CODESTREAM_MAX_TOKENS", "4096")
            .parse()
            .context("Invalid CODESTREAM_MAX_TOKENS")?;
        let app_name = lookup("NEXT_PUBLIC_APP_NAME", "AI Chat App");
        let site_url = lookup("NEXT_PUBLIC_SITE_URL", "http://localhost:3000");

        let captured = vars
            .into_iter()
            .filter(|(k, v)| {
                !v.is_empty() && CAPTURED_SUFFIXES.iter().any(|suffix| k.ends_with(suffix))
            })
            .collect();

        Ok(Self {
            request_timeout_secs,
            default_temperature,
            max_tokens,
            app_name,
            site_url,
            vars: captured,
        })
    }

    /// Look up an optional captured variable
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Look up a required credential, failing with a configuration error naming it
    pub fn require(
        &self,
        vendor: &'static str,
        credential: &'static str,
    ) -> std::result::Result<&str, CodegenError> {
        self.var(credential)
            .ok_or(CodegenError::Configuration { vendor, credential })
    }
}
