//! Provider registry
//!
//! Resolves composite `vendor/model` identifiers to constructed providers.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::Result;
use crate::metrics::record_request;
use crate::providers::{build_provider, Provider, Vendor};
use crate::streaming::{strip_fence_stream, FragmentStream};
use crate::types::{ChatCompletionRequest, ModelId};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A provider resolved for one model identifier
#[derive(Clone)]
pub struct ResolvedProvider {
    pub vendor: Vendor,
    /// Vendor-side model name after table mapping
    pub model: String,
    pub provider: Arc<dyn Provider>,
}

impl std::fmt::Debug for ResolvedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedProvider")
            .field("vendor", &self.vendor)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// Maps vendor names to provider constructors
///
/// Holds configuration and a pooled HTTP client; providers are built on
/// resolution and share the client.
pub struct ProviderRegistry {
    config: Config,
    client: reqwest::Client,
}

impl ProviderRegistry {
    /// Create a registry with a pooled HTTP client
    ///
    /// The configured timeout bounds each read, so a stream may run as long
    /// as the vendor keeps sending.
    pub fn new(config: Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::with_client(config, client))
    }

    /// Create a registry around an existing HTTP client
    pub fn with_client(config: Config, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve `vendor/model` to a provider and the vendor-side model name.
    ///
    /// Fails with `InvalidIdentifier`, `UnknownVendor` or `Configuration`
    /// before any network activity.
    #[instrument(skip(self))]
    pub fn resolve(&self, identifier: &str) -> Result<ResolvedProvider> {
        let resolved = ModelId::parse(identifier)
            .and_then(|id| {
                let vendor: Vendor = id.vendor.parse()?;
                Ok((vendor, id))
            })
            .and_then(|(vendor, id)| {
                let provider = build_provider(vendor, self.client.clone(), &self.config)?;
                Ok(ResolvedProvider {
                    vendor,
                    model: vendor.map_model(&id.model),
                    provider,
                })
            });

        match &resolved {
            Ok(resolved) => {
                info!(vendor = %resolved.vendor, model = %resolved.model, "Resolved provider")
            }
            Err(e) => {
                warn!(error = %e, "Failed to resolve provider");
                record_request("unresolved", e.code());
            }
        }
        resolved
    }

    /// Resolve the request's model, submit it and strip any markdown fence
    /// from the resulting fragments.
    pub async fn generate(&self, request: &ChatCompletionRequest) -> Result<FragmentStream> {
        let resolved = self.resolve(&request.model)?;
        let fragments = resolved.provider.submit(request).await?;
        Ok(strip_fence_stream(fragments))
    }
}
