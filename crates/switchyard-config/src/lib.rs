#![allow(clippy::must_use_candidate)]

pub mod agent;
pub mod company;
mod env;
pub mod history;
pub mod llm;
mod loader;
pub mod telemetry;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;
use switchyard_core::{ConfigurationProvider, CredentialRefs, PreambleSource};

pub use agent::*;
pub use company::*;
pub use history::*;
pub use llm::*;
pub use telemetry::{LogFormat, TelemetryConfig};

/// Top-level Switchyard configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Provider endpoints and model patterns
    #[serde(default)]
    pub llm: LlmConfig,
    /// Per-company settings keyed by short name
    #[serde(default)]
    pub companies: IndexMap<String, CompanyConfig>,
    /// Client-side history budget
    #[serde(default)]
    pub history: HistoryConfig,
    /// Agent loop limits
    #[serde(default)]
    pub agent: AgentConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}

impl Config {
    /// Settings for one company, matched case-insensitively
    pub fn company(&self, company: &str) -> Option<&CompanyConfig> {
        self.companies
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(company))
            .map(|(_, cfg)| cfg)
    }
}

impl ConfigurationProvider for Config {
    fn credential_refs(&self, company: &str) -> Option<CredentialRefs> {
        self.company(company).map(CompanyConfig::credential_refs)
    }

    fn http_allowed_hosts(&self, company: &str) -> Option<Vec<String>> {
        self.company(company).and_then(|c| c.http_tools.allowed_hosts.clone())
    }
}

#[async_trait]
impl PreambleSource for Config {
    async fn build_preamble(&self, company: &str, user: &str) -> switchyard_core::Result<String> {
        let preamble = self
            .company(company)
            .and_then(|c| c.preamble.clone())
            .unwrap_or_else(|| format!("You are the assistant for {company}."));
        Ok(format!("{preamble}\n\nCurrent user: {user}"))
    }
}

#[cfg(test)]
mod tests {
    use switchyard_core::ProviderKind;

    use super::*;

    fn parse(raw: &str) -> Config {
        toml::from_str(raw).unwrap()
    }

    #[test]
    fn credential_refs_map_company_keys() {
        let config = parse(
            r#"
            [companies.acme]
            api_key = "ACME_LEGACY"

            [companies.acme.provider_api_keys]
            openai = "ACME_OPENAI"
            "#,
        );

        let refs = config.credential_refs("ACME").unwrap();
        assert_eq!(refs.legacy.as_deref(), Some("ACME_LEGACY"));
        assert_eq!(refs.reference_for(ProviderKind::OpenAi), Some("ACME_OPENAI"));
        assert_eq!(refs.reference_for(ProviderKind::Anthropic), Some("ACME_LEGACY"));
        assert!(config.credential_refs("globex").is_none());
    }

    #[test]
    fn allowed_hosts_come_from_http_tools_section() {
        let config = parse(
            r#"
            [companies.acme.http_tools]
            allowed_hosts = ["api.example.com", "*.internal.example.com"]
            "#,
        );

        let hosts = config.http_allowed_hosts("acme").unwrap();
        assert_eq!(hosts, vec!["api.example.com", "*.internal.example.com"]);
    }

    #[tokio::test]
    async fn preamble_falls_back_to_company_name() {
        let config = parse("[companies.acme]\n");
        let preamble = config.build_preamble("acme", "ana@acme.com").await.unwrap();
        assert!(preamble.starts_with("You are the assistant for acme."));
        assert!(preamble.ends_with("Current user: ana@acme.com"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = toml::from_str::<Config>("[companies.acme]\nsecret = 1\n").unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }
}
