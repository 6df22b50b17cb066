use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{ProviderKind, Result};

/// Secret references a company configured for LLM access
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialRefs {
    /// Per-provider secret references
    pub provider_keys: BTreeMap<ProviderKind, String>,
    /// Company-wide reference used when no per-provider one exists
    pub legacy: Option<String>,
}

impl CredentialRefs {
    /// Reference to resolve for `provider`, per-provider first
    pub fn reference_for(&self, provider: ProviderKind) -> Option<&str> {
        self.provider_keys
            .get(&provider)
            .map(String::as_str)
            .filter(|r| !r.trim().is_empty())
            .or_else(|| self.legacy.as_deref().filter(|r| !r.trim().is_empty()))
    }
}

/// Read-only view of per-company settings
pub trait ConfigurationProvider: Send + Sync {
    /// LLM credential references, `None` when the company is unknown
    fn credential_refs(&self, company: &str) -> Option<CredentialRefs>;

    /// Company-wide HTTP tool host allow-list, if one is configured
    fn http_allowed_hosts(&self, company: &str) -> Option<Vec<String>>;
}

/// Builds the system/company preamble that opens every conversation
#[async_trait]
pub trait PreambleSource: Send + Sync {
    async fn build_preamble(&self, company: &str, user: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_provider_reference_wins() {
        let refs = CredentialRefs {
            provider_keys: BTreeMap::from([(ProviderKind::OpenAi, "OPENAI_KEY".to_owned())]),
            legacy: Some("LEGACY_KEY".to_owned()),
        };
        assert_eq!(refs.reference_for(ProviderKind::OpenAi), Some("OPENAI_KEY"));
        assert_eq!(refs.reference_for(ProviderKind::Gemini), Some("LEGACY_KEY"));
    }

    #[test]
    fn blank_references_are_skipped() {
        let refs = CredentialRefs {
            provider_keys: BTreeMap::from([(ProviderKind::Anthropic, "  ".to_owned())]),
            legacy: None,
        };
        assert_eq!(refs.reference_for(ProviderKind::Anthropic), None);
    }
}
