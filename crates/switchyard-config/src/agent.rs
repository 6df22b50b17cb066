use serde::Deserialize;

/// Agent loop settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Upper bound on tool-calling rounds per question
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
    /// Model used when a query names none
    #[serde(default = "default_model")]
    pub default_model: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            default_model: default_model(),
        }
    }
}

const fn default_max_tool_rounds() -> usize {
    8
}

fn default_model() -> String {
    "gpt-5".to_owned()
}
