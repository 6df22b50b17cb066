//! Provider adapters and the shared vendor HTTP client

pub mod anthropic;
pub mod chat;
pub mod gemini;
pub mod responses;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use switchyard_config::ProviderEndpointConfig;
use switchyard_core::{Error, ProviderKind, Result};
use url::Url;

pub use anthropic::AnthropicAdapter;
pub use chat::ChatCompletionsAdapter;
pub use gemini::GeminiAdapter;
pub use responses::ResponsesAdapter;

use crate::types::{CreateResponseRequest, LlmResponse};

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Read timeout when the endpoint config sets none
const DEFAULT_TIMEOUT_SECS: u64 = 120;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// One vendor wire protocol behind the canonical contract
#[async_trait]
pub trait Adapter: Send + Sync {
    fn provider(&self) -> ProviderKind;

    /// Send one canonical request and normalize the reply
    async fn create_response(&self, request: &CreateResponseRequest) -> Result<LlmResponse>;
}

/// Default API base URL for a provider
pub const fn default_base_url(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::OpenAi => "https://api.openai.com/v1",
        ProviderKind::Xai => "https://api.x.ai/v1",
        ProviderKind::DeepSeek => "https://api.deepseek.com",
        ProviderKind::Anthropic => "https://api.anthropic.com/v1",
        ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
    }
}

/// Authenticated HTTP client for one provider and credential
///
/// Shared between adapters through the router's client cache; `reqwest`
/// clients pool connections and are safe to use concurrently.
pub struct VendorClient {
    provider: ProviderKind,
    http: Client,
    base_url: Url,
    api_key: SecretString,
}

impl VendorClient {
    pub fn new(provider: ProviderKind, endpoint: &ProviderEndpointConfig, api_key: SecretString) -> Result<Self> {
        let base_url = match &endpoint.base_url {
            Some(url) => url.clone(),
            None => Url::parse(default_base_url(provider))
                .map_err(|e| Error::Llm(format!("invalid base URL for {provider}: {e}")))?,
        };

        let http = Client::builder()
            .timeout(Duration::from_secs(endpoint.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| Error::Llm(format!("failed to build {provider} client: {e}")))?;

        Ok(Self {
            provider,
            http,
            base_url,
            api_key,
        })
    }

    pub const fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/{path}")
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let key = self.api_key.expose_secret();
        match self.provider {
            ProviderKind::Anthropic => builder
                .header("x-api-key", key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            ProviderKind::Gemini => builder.header("x-goog-api-key", key),
            ProviderKind::OpenAi | ProviderKind::Xai | ProviderKind::DeepSeek => builder.bearer_auth(key),
        }
    }

    /// POST a JSON body and decode a JSON reply
    ///
    /// Transport failures, non-success statuses and undecodable bodies all
    /// come back as `Error::Llm` with the provider name in the message.
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let provider = self.provider;
        let builder = self.http.post(self.url(path)).json(body);

        let response = self.authorize(builder).send().await.map_err(|e| {
            tracing::error!(provider = %provider, error = %e, "upstream request failed");
            Error::Llm(format!("{provider} request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(provider = %provider, status = %status, "upstream returned error");
            return Err(Error::Llm(format!("{provider} returned {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("{provider} returned an unreadable response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SecretString {
        SecretString::from("sk-test")
    }

    #[test]
    fn defaults_to_vendor_base_url() {
        let client = VendorClient::new(ProviderKind::Anthropic, &ProviderEndpointConfig::default(), key()).unwrap();
        assert_eq!(client.url("messages"), "https://api.anthropic.com/v1/messages");
    }

    #[test]
    fn override_base_url_joins_paths() {
        let endpoint = ProviderEndpointConfig {
            base_url: Some(Url::parse("http://127.0.0.1:9000/v1/").unwrap()),
            timeout: Some(3),
        };
        let client = VendorClient::new(ProviderKind::OpenAi, &endpoint, key()).unwrap();
        assert_eq!(client.url("responses"), "http://127.0.0.1:9000/v1/responses");
        assert_eq!(client.provider(), ProviderKind::OpenAi);
    }

    #[test]
    fn every_provider_has_a_parseable_default() {
        for provider in ProviderKind::ALL {
            assert!(Url::parse(default_base_url(provider)).is_ok());
        }
    }
}
