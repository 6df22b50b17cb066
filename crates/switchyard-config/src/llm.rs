use indexmap::IndexMap;
use serde::Deserialize;
use switchyard_core::ProviderKind;
use url::Url;

/// Top-level LLM configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// Endpoint overrides keyed by provider
    #[serde(default)]
    pub providers: IndexMap<ProviderKind, ProviderEndpointConfig>,
    /// Extra model-name substrings mapped to a provider
    #[serde(default)]
    pub models: IndexMap<String, ProviderKind>,
}

impl LlmConfig {
    pub fn endpoint(&self, provider: ProviderKind) -> Option<&ProviderEndpointConfig> {
        self.providers.get(&provider)
    }
}

/// Connection settings for one provider
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderEndpointConfig {
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
}
