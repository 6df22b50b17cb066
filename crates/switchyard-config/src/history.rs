use serde::Deserialize;

/// Client-side history settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Token budget for replayed history
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: default_max_context_tokens(),
        }
    }
}

const fn default_max_context_tokens() -> usize {
    100_000
}
