//! Configuration builders pointing every provider at the mock vendor

use std::collections::HashMap;

use indexmap::IndexMap;
use switchyard_config::{AgentConfig, CompanyConfig, Config, LlmConfig, ProviderEndpointConfig};
use switchyard_core::ProviderKind;

use super::mock_vendor::MockVendor;

pub const COMPANY: &str = "acme";
pub const COMPANY_KEY_REF: &str = "ACME_LLM_KEY";
pub const COMPANY_KEY: &str = "sk-acme-test";
pub const PREAMBLE: &str = "You answer questions about Acme orders.";

const PROVIDERS: [ProviderKind; 5] = [
    ProviderKind::OpenAi,
    ProviderKind::Anthropic,
    ProviderKind::Gemini,
    ProviderKind::DeepSeek,
    ProviderKind::Xai,
];

pub struct ConfigBuilder {
    llm: LlmConfig,
    companies: IndexMap<String, CompanyConfig>,
    agent: AgentConfig,
}

impl ConfigBuilder {
    /// One company with a company-wide key, every provider on `mock`
    pub fn new(mock: &MockVendor) -> Self {
        let providers = PROVIDERS
            .into_iter()
            .map(|provider| {
                let endpoint = ProviderEndpointConfig {
                    base_url: Some(mock.base_url(provider)),
                    timeout: Some(10),
                };
                (provider, endpoint)
            })
            .collect();

        let company = CompanyConfig {
            api_key: Some(COMPANY_KEY_REF.to_owned()),
            preamble: Some(PREAMBLE.to_owned()),
            ..CompanyConfig::default()
        };

        Self {
            llm: LlmConfig {
                providers,
                models: IndexMap::new(),
            },
            companies: IndexMap::from([(COMPANY.to_owned(), company)]),
            agent: AgentConfig::default(),
        }
    }

    /// Secret reference used only for `provider`
    pub fn provider_key(mut self, provider: ProviderKind, reference: &str) -> Self {
        if let Some(company) = self.companies.get_mut(COMPANY) {
            company.provider_api_keys.insert(provider, reference.to_owned());
        }
        self
    }

    pub fn without_company_key(mut self) -> Self {
        if let Some(company) = self.companies.get_mut(COMPANY) {
            company.api_key = None;
        }
        self
    }

    pub fn max_tool_rounds(mut self, rounds: usize) -> Self {
        self.agent.max_tool_rounds = rounds;
        self
    }

    pub fn build(self) -> Config {
        Config {
            llm: self.llm,
            companies: self.companies,
            agent: self.agent,
            ..Config::default()
        }
    }
}

/// Secrets the tests resolve references against
pub fn secrets() -> HashMap<String, String> {
    HashMap::from([(COMPANY_KEY_REF.to_owned(), COMPANY_KEY.to_owned())])
}
