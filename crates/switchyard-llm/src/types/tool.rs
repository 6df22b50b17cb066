use std::fmt;

use serde::{Deserialize, Serialize};

/// Function definition offered to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: serde_json::Value,
    #[serde(default)]
    pub strict: bool,
}

/// Caller's policy for whether and which tool the model must call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ToolChoice {
    #[default]
    Auto,
    Required,
    None,
    /// Force a specific tool by name
    Named(String),
}

impl ToolChoice {
    /// Parse the string form; blank means `auto`
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "auto" => Self::Auto,
            "required" => Self::Required,
            "none" => Self::None,
            name => Self::Named(name.to_owned()),
        }
    }

    /// Policy an adapter should apply given the tools actually offered
    ///
    /// A named tool that is not among `tools` degrades to `auto`.
    pub fn effective(&self, tools: &[ToolSpec]) -> Self {
        match self {
            Self::Named(name) if !tools.iter().any(|t| &t.name == name) => {
                tracing::warn!(tool = %name, "tool_choice names an unknown tool, using auto");
                Self::Auto
            }
            other => other.clone(),
        }
    }
}

impl fmt::Display for ToolChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Required => f.write_str("required"),
            Self::None => f.write_str("none"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn spec(name: &str) -> ToolSpec {
        ToolSpec {
            name: name.to_owned(),
            description: String::new(),
            parameters: json!({"type": "object"}),
            strict: true,
        }
    }

    #[test]
    fn parses_policies() {
        assert_eq!(ToolChoice::parse(""), ToolChoice::Auto);
        assert_eq!(ToolChoice::parse("required"), ToolChoice::Required);
        assert_eq!(ToolChoice::parse("none"), ToolChoice::None);
        assert_eq!(ToolChoice::parse("iat_sql_query"), ToolChoice::Named("iat_sql_query".into()));
    }

    #[test]
    fn unknown_named_tool_degrades_to_auto() {
        let tools = [spec("iat_sql_query")];
        assert_eq!(ToolChoice::Named("other".into()).effective(&tools), ToolChoice::Auto);
        assert_eq!(
            ToolChoice::Named("iat_sql_query".into()).effective(&tools),
            ToolChoice::Named("iat_sql_query".into())
        );
        assert_eq!(ToolChoice::None.effective(&tools), ToolChoice::None);
    }
}
