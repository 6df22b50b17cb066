use indexmap::IndexMap;
use serde::Deserialize;
use switchyard_core::{CredentialRefs, ProviderKind};

/// Settings for one tenant company
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanyConfig {
    /// Company-wide secret reference for every provider
    #[serde(default)]
    pub api_key: Option<String>,
    /// Secret references per provider, checked before `api_key`
    #[serde(default)]
    pub provider_api_keys: IndexMap<ProviderKind, String>,
    /// HTTP tool settings
    #[serde(default)]
    pub http_tools: HttpToolsConfig,
    /// Opening context sent when a conversation is (re)initialized
    #[serde(default)]
    pub preamble: Option<String>,
}

impl CompanyConfig {
    pub fn credential_refs(&self) -> CredentialRefs {
        CredentialRefs {
            provider_keys: self
                .provider_api_keys
                .iter()
                .map(|(provider, reference)| (*provider, reference.clone()))
                .collect(),
            legacy: self.api_key.clone(),
        }
    }
}

/// Company-wide HTTP tool policy
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpToolsConfig {
    /// Host patterns outbound tool calls may reach (`*.suffix` allowed)
    #[serde(default)]
    pub allowed_hosts: Option<Vec<String>>,
}
