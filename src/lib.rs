//! Codestream - multi-vendor code generation streaming
//!
//! This library resolves `vendor/model` identifiers to vendor providers,
//! submits code generation requests and normalizes each vendor's streamed
//! response into an ordered sequence of plain-text fragments, optionally with
//! a surrounding markdown code fence removed.

pub mod config;
pub mod error;
pub mod metrics;
pub mod providers;
pub mod registry;
pub mod streaming;
pub mod types;

pub use crate::config::Config;
pub use crate::error::{CodegenError, Result};
pub use crate::providers::{Provider, Vendor};
pub use crate::registry::{ProviderRegistry, ResolvedProvider};
pub use crate::streaming::{FenceStripper, FragmentStream, PayloadFormat, StreamHandler, StreamNormalizer};
pub use crate::types::{ChatCompletionRequest, Message, ModelId, Role};
