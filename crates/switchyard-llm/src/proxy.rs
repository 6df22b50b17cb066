//! Provider router: model to adapter resolution with per-company credentials

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use secrecy::SecretString;
use switchyard_config::{LlmConfig, ProviderEndpointConfig};
use switchyard_core::{ConfigurationProvider, Error, ProviderKind, Result, SecretProvider};

use crate::adapter::{Adapter, AnthropicAdapter, ChatCompletionsAdapter, GeminiAdapter, ResponsesAdapter};
use crate::cache::{AdapterCache, AdapterKey, ClientCache};
use crate::registry::{HistoryType, ModelRegistry};
use crate::tokens::{TiktokenCounter, TokenCounter};
use crate::types::{CreateResponseRequest, LlmResponse};

/// What the agent loop and history manager need from the LLM layer
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn create_response(&self, company: &str, request: &CreateResponseRequest) -> Result<LlmResponse>;

    fn history_type(&self, model: &str) -> Result<HistoryType>;

    fn count_tokens(&self, text: &str) -> usize;
}

/// Routes canonical requests to the adapter serving the model
pub struct LlmProxy {
    registry: ModelRegistry,
    endpoints: IndexMap<ProviderKind, ProviderEndpointConfig>,
    configuration: Arc<dyn ConfigurationProvider>,
    secrets: Arc<dyn SecretProvider>,
    clients: Arc<ClientCache>,
    adapters: AdapterCache,
    tokens: Arc<dyn TokenCounter>,
}

impl LlmProxy {
    pub fn new(
        config: &LlmConfig,
        configuration: Arc<dyn ConfigurationProvider>,
        secrets: Arc<dyn SecretProvider>,
        clients: Arc<ClientCache>,
    ) -> Self {
        Self {
            registry: ModelRegistry::from_config(config),
            endpoints: config.providers.clone(),
            configuration,
            secrets,
            clients,
            adapters: AdapterCache::default(),
            tokens: Arc::new(TiktokenCounter::new()),
        }
    }

    #[must_use]
    pub fn with_token_counter(mut self, tokens: Arc<dyn TokenCounter>) -> Self {
        self.tokens = tokens;
        self
    }

    pub const fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Credential for `(company, provider)`: per-provider reference, then
    /// the company-wide one
    pub fn resolve_api_key(&self, company: &str, provider: ProviderKind) -> Result<SecretString> {
        let refs = self.configuration.credential_refs(company).unwrap_or_default();
        let Some(reference) = refs.reference_for(provider) else {
            return Err(Error::ApiKey(format!(
                "no API key reference configured for company '{company}' and provider '{provider}'"
            )));
        };

        match self.secrets.get_secret(company, reference) {
            Some(value) if !value.trim().is_empty() => Ok(SecretString::from(value)),
            _ => Err(Error::ApiKey(format!(
                "environment variable '{reference}' for company '{company}' and provider '{provider}' is not set or is empty"
            ))),
        }
    }

    fn adapter_for(&self, company: &str, provider: ProviderKind) -> Result<Arc<dyn Adapter>> {
        let api_key = self.resolve_api_key(company, provider)?;
        let key = AdapterKey::new(company, provider, &api_key);

        self.adapters.get_or_try_insert(key, || {
            let endpoint = self.endpoints.get(&provider).cloned().unwrap_or_default();
            let client = self.clients.get_or_create(provider, &endpoint, &api_key)?;
            tracing::debug!(company = %company, provider = %provider, "creating adapter");

            let adapter: Arc<dyn Adapter> = match provider {
                ProviderKind::OpenAi | ProviderKind::Xai => Arc::new(ResponsesAdapter::new(client)),
                ProviderKind::Anthropic => Arc::new(AnthropicAdapter::new(client)),
                ProviderKind::Gemini => Arc::new(GeminiAdapter::new(client)),
                ProviderKind::DeepSeek => Arc::new(ChatCompletionsAdapter::new(client)),
            };
            Ok(adapter)
        })
    }

    /// Forget adapters built for `company` so new credentials apply
    pub fn invalidate(&self, company: &str) {
        tracing::info!(company = %company, "invalidating cached adapters");
        self.adapters.invalidate_company(company);
    }

    /// Forget every adapter and every shared vendor client
    pub fn invalidate_all(&self) {
        tracing::info!("invalidating all cached clients and adapters");
        self.adapters.clear();
        self.clients.clear();
    }

    pub fn cached_adapters(&self) -> usize {
        self.adapters.len()
    }
}

#[async_trait]
impl LlmGateway for LlmProxy {
    async fn create_response(&self, company: &str, request: &CreateResponseRequest) -> Result<LlmResponse> {
        let provider = self.registry.provider_for(&request.model)?;
        let adapter = self.adapter_for(company, provider)?;

        tracing::info!(
            company = %company,
            provider = %provider,
            model = %request.model,
            tools = request.tools.len(),
            "creating response"
        );

        let response = adapter.create_response(request).await.inspect_err(|e| {
            tracing::error!(company = %company, provider = %provider, model = %request.model, error = %e, "llm call failed");
        })?;

        tracing::debug!(
            provider = %provider,
            status = ?response.status(),
            tool_calls = response.output().len(),
            total_tokens = response.usage().total_tokens,
            "response received"
        );
        Ok(response)
    }

    fn history_type(&self, model: &str) -> Result<HistoryType> {
        self.registry.history_type(model)
    }

    fn count_tokens(&self, text: &str) -> usize {
        self.tokens.count(text)
    }
}
