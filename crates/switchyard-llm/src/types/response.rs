use std::ops::AddAssign;

use serde::Serialize;
use serde_json::{Map, Value};

/// Token accounting for one or more turns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    /// Build from possibly-missing vendor counters
    ///
    /// Missing counters are zero; a missing total is the sum of the others.
    pub fn from_counts(input: Option<u64>, output: Option<u64>, total: Option<u64>) -> Self {
        let input_tokens = input.unwrap_or(0);
        let output_tokens = output.unwrap_or(0);
        Self {
            input_tokens,
            output_tokens,
            total_tokens: total.unwrap_or(input_tokens + output_tokens),
        }
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, rhs: Self) {
        self.input_tokens += rhs.input_tokens;
        self.output_tokens += rhs.output_tokens;
        self.total_tokens += rhs.total_tokens;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
enum FunctionCallTag {
    #[default]
    #[serde(rename = "function_call")]
    FunctionCall,
}

/// A model's request to run a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCall {
    pub call_id: String,
    #[serde(rename = "type")]
    tag: FunctionCallTag,
    pub name: String,
    /// JSON-encoded arguments object, always parseable
    pub arguments: String,
}

impl ToolCall {
    /// Build from a vendor's raw arguments value
    ///
    /// Objects are kept; JSON strings are parsed; anything that is not an
    /// object after that is wrapped as `{"value": ...}`.
    pub fn new(call_id: impl Into<String>, name: impl Into<String>, arguments: &Value) -> Self {
        Self {
            call_id: call_id.into(),
            tag: FunctionCallTag::FunctionCall,
            name: name.into(),
            arguments: normalize_arguments(arguments),
        }
    }

    /// Arguments parsed back into an object
    pub fn arguments_map(&self) -> Map<String, Value> {
        match serde_json::from_str(&self.arguments) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

fn normalize_arguments(raw: &Value) -> String {
    let value = match raw {
        Value::Null => Value::Object(Map::new()),
        Value::String(s) if s.trim().is_empty() => Value::Object(Map::new()),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => Value::Object(map),
            Ok(other) => wrap_value(other),
            Err(_) => wrap_value(Value::String(s.clone())),
        },
        Value::Object(map) => Value::Object(map.clone()),
        other => wrap_value(other.clone()),
    };
    value.to_string()
}

fn wrap_value(value: Value) -> Value {
    let mut map = Map::new();
    map.insert("value".to_owned(), value);
    Value::Object(map)
}

/// Source of an image content part
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub media_type: String,
    pub data: String,
}

/// Ordered fragment of a multimodal answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    Image { source: ImageSource },
}

impl ContentPart {
    pub fn image_base64(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Image {
            source: ImageSource {
                source_type: "base64".to_owned(),
                media_type: media_type.into(),
                data: data.into(),
            },
        }
    }
}

/// Whether the model finished or wants tools run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Completed,
    ToolCalls,
}

/// Placeholder written into `output_text` for each generated image
pub const IMAGE_PLACEHOLDER: &str = "[Generated image]";

/// Normalized result of one provider call
///
/// `status` is derived from `output`, so a response reports `tool_calls`
/// exactly when it carries at least one tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmResponse {
    id: String,
    model: String,
    status: ResponseStatus,
    output_text: String,
    output: Vec<ToolCall>,
    usage: Usage,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_parts: Option<Vec<ContentPart>>,
}

impl LlmResponse {
    pub fn new(
        id: impl Into<String>,
        model: impl Into<String>,
        output_text: impl Into<String>,
        output: Vec<ToolCall>,
        usage: Usage,
    ) -> Self {
        let status = if output.is_empty() {
            ResponseStatus::Completed
        } else {
            ResponseStatus::ToolCalls
        };

        Self {
            id: id.into(),
            model: model.into(),
            status,
            output_text: output_text.into(),
            output,
            usage,
            reasoning_content: None,
            content_parts: None,
        }
    }

    /// Attach reasoning text, ignoring blank values
    #[must_use]
    pub fn with_reasoning(mut self, reasoning: Option<String>) -> Self {
        self.reasoning_content = reasoning.filter(|r| !r.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_content_parts(mut self, parts: Vec<ContentPart>) -> Self {
        self.content_parts = (!parts.is_empty()).then_some(parts);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub const fn status(&self) -> ResponseStatus {
        self.status
    }

    pub fn output_text(&self) -> &str {
        &self.output_text
    }

    pub fn output(&self) -> &[ToolCall] {
        &self.output
    }

    pub const fn usage(&self) -> Usage {
        self.usage
    }

    pub fn reasoning_content(&self) -> Option<&str> {
        self.reasoning_content.as_deref()
    }

    pub fn content_parts(&self) -> Option<&[ContentPart]> {
        self.content_parts.as_deref()
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.output.is_empty()
    }
}
