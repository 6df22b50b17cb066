use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::execution::ExecutionConfig;

/// How a tool is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolType {
    /// A method on the company's registered toolset
    Native,
    /// A built-in handler shared by every company
    System,
    /// An outbound call through the sandbox
    Http,
    /// A prediction from the inference backend
    Inference,
}

impl ToolType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Native => "NATIVE",
            Self::System => "SYSTEM",
            Self::Http => "HTTP",
            Self::Inference => "INFERENCE",
        }
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NATIVE" => Ok(Self::Native),
            "SYSTEM" => Ok(Self::System),
            "HTTP" => Ok(Self::Http),
            "INFERENCE" => Ok(Self::Inference),
            other => Err(format!("unknown tool type '{other}'")),
        }
    }
}

/// A registered tool
#[derive(Debug, Clone, PartialEq)]
pub struct Tool {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: Value,
    pub tool_type: ToolType,
    /// Present only for HTTP tools
    pub execution_config: Option<ExecutionConfig>,
    pub is_active: bool,
}

/// Definition used to create or sync a company tool
#[derive(Debug, Clone, PartialEq)]
pub struct NewTool {
    pub name: String,
    pub description: String,
    pub parameters: Value,
    pub tool_type: ToolType,
    /// Raw JSON, validated on create
    pub execution_config: Option<Value>,
    pub is_active: bool,
}

impl NewTool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, tool_type: ToolType) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
            tool_type,
            execution_config: None,
            is_active: true,
        }
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    #[must_use]
    pub fn with_execution_config(mut self, config: Value) -> Self {
        self.execution_config = Some(config);
        self
    }
}

/// Partial update; `None` fields keep their value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolUpdate {
    pub description: Option<String>,
    pub parameters: Option<Value>,
    pub execution_config: Option<Value>,
    pub is_active: Option<bool>,
}
