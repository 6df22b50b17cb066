//! Model name to provider resolution

use std::fmt;

use switchyard_config::LlmConfig;
use switchyard_core::{Error, ProviderKind, Result};

/// Built-in substring patterns, checked after configured ones
const DEFAULT_PATTERNS: &[(&str, ProviderKind)] = &[
    ("gpt", ProviderKind::OpenAi),
    ("gemini", ProviderKind::Gemini),
    ("deepseek", ProviderKind::DeepSeek),
    ("grok", ProviderKind::Xai),
    ("claude", ProviderKind::Anthropic),
];

/// Who keeps the conversation between turns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryType {
    /// The provider stores it; only the last response id is kept locally
    ServerSide,
    /// The full message list is replayed on every call
    ClientSide,
}

impl HistoryType {
    pub const fn for_provider(provider: ProviderKind) -> Self {
        match provider {
            ProviderKind::OpenAi | ProviderKind::Xai => Self::ServerSide,
            ProviderKind::Gemini | ProviderKind::DeepSeek | ProviderKind::Anthropic => Self::ClientSide,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServerSide => "server_side",
            Self::ClientSide => "client_side",
        }
    }
}

impl fmt::Display for HistoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, case-insensitive substring rules; first match wins
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    patterns: Vec<(String, ProviderKind)>,
}

impl ModelRegistry {
    /// Registry with `extra` patterns ahead of the built-in ones
    pub fn new(extra: impl IntoIterator<Item = (String, ProviderKind)>) -> Self {
        let patterns = extra
            .into_iter()
            .map(|(pattern, provider)| (pattern.to_lowercase(), provider))
            .chain(
                DEFAULT_PATTERNS
                    .iter()
                    .map(|(pattern, provider)| ((*pattern).to_owned(), *provider)),
            )
            .collect();
        Self { patterns }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config.models.iter().map(|(pattern, provider)| (pattern.clone(), *provider)))
    }

    /// Provider serving `model`, or `Error::Model` when nothing matches
    pub fn provider_for(&self, model: &str) -> Result<ProviderKind> {
        let lower = model.trim().to_lowercase();
        if lower.is_empty() {
            return Err(Error::Model("model name is empty".to_owned()));
        }

        self.patterns
            .iter()
            .find(|(pattern, _)| lower.contains(pattern.as_str()))
            .map(|(_, provider)| *provider)
            .ok_or_else(|| Error::Model(model.to_owned()))
    }

    pub fn history_type(&self, model: &str) -> Result<HistoryType> {
        self.provider_for(model).map(HistoryType::for_provider)
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(std::iter::empty())
    }
}

#[cfg(test)]
mod tests {
    use switchyard_core::ErrorKind;

    use super::*;

    #[test]
    fn default_patterns_match_case_insensitively() {
        let registry = ModelRegistry::default();
        assert_eq!(registry.provider_for("GPT-5").unwrap(), ProviderKind::OpenAi);
        assert_eq!(registry.provider_for("gemini-2.5-pro").unwrap(), ProviderKind::Gemini);
        assert_eq!(registry.provider_for("deepseek-chat").unwrap(), ProviderKind::DeepSeek);
        assert_eq!(registry.provider_for("grok-4").unwrap(), ProviderKind::Xai);
        assert_eq!(registry.provider_for("claude-sonnet-4").unwrap(), ProviderKind::Anthropic);
    }

    #[test]
    fn unknown_model_is_model_error() {
        let registry = ModelRegistry::default();
        assert_eq!(registry.provider_for("llama-3").unwrap_err().kind(), ErrorKind::Model);
        assert_eq!(registry.provider_for("  ").unwrap_err().kind(), ErrorKind::Model);
    }

    #[test]
    fn configured_patterns_win() {
        let registry = ModelRegistry::new([("GPT-OSS".to_owned(), ProviderKind::DeepSeek)]);
        assert_eq!(registry.provider_for("gpt-oss-120b").unwrap(), ProviderKind::DeepSeek);
        assert_eq!(registry.provider_for("gpt-5").unwrap(), ProviderKind::OpenAi);
    }

    #[test]
    fn history_type_per_provider() {
        let registry = ModelRegistry::default();
        assert_eq!(registry.history_type("gpt-5").unwrap(), HistoryType::ServerSide);
        assert_eq!(registry.history_type("grok-4").unwrap(), HistoryType::ServerSide);
        assert_eq!(registry.history_type("claude-opus-4").unwrap(), HistoryType::ClientSide);
        assert_eq!(registry.history_type("deepseek-chat").unwrap(), HistoryType::ClientSide);
    }
}
