//! Error types for Codestream
//!
//! This module defines the error type returned by every fallible operation in
//! the crate, from model resolution through in-flight stream failures.

use thiserror::Error;

/// Codestream errors
///
/// Every variant except `MalformedPayload` is terminal for the request that
/// produced it. Malformed payload lines are recovered inside the normalizer
/// and never reach callers.
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("{credential} is required for the {vendor} provider")]
    Configuration {
        vendor: &'static str,
        credential: &'static str,
    },

    #[error("Invalid model identifier '{0}'. Expected format: \"vendor/model\"")]
    InvalidIdentifier(String),

    #[error("Unknown provider: {0}")]
    UnknownVendor(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("{vendor} API error {status}: {message}")]
    VendorApi {
        vendor: &'static str,
        status: u16,
        message: String,
    },

    #[error("Unexpected {vendor} response: {message}")]
    UnexpectedResponse {
        vendor: &'static str,
        message: String,
    },
}

impl CodegenError {
    /// Short machine-readable code, used as a metrics label and in SSE error events
    pub fn code(&self) -> &'static str {
        match self {
            CodegenError::Configuration { .. } => "configuration_error",
            CodegenError::InvalidIdentifier(_) => "invalid_identifier",
            CodegenError::UnknownVendor(_) => "unknown_vendor",
            CodegenError::Transport(_) | CodegenError::Stream(_) => "transport_error",
            CodegenError::VendorApi { .. } => "vendor_api_error",
            CodegenError::UnexpectedResponse { .. } => "unexpected_response",
        }
    }
}

/// A payload line that could not be parsed as a structured object.
///
/// Only used internally: the normalizer recovers by emitting the line as raw text.
#[derive(Debug, Error)]
#[error("Malformed payload: {0}")]
pub struct MalformedPayload(pub String);

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CodegenError>;
