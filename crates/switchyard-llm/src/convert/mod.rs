//! Conversion between canonical types and vendor wire formats

pub mod anthropic;
pub mod chat;
pub mod gemini;
pub mod responses;

use serde_json::{Value, json};

use crate::types::{ContentPart, IMAGE_PLACEHOLDER, LlmResponse, ToolCall, Usage};

/// Text used when a tool result cannot be paired with its invocation
pub(crate) fn tool_result_fallback(output: &str) -> String {
    format!("Tool result:\n{output}")
}

/// Tool output as JSON, or as a JSON string when it is not JSON
pub(crate) fn parse_output(output: &str) -> Value {
    serde_json::from_str(output).unwrap_or_else(|_| Value::String(output.to_owned()))
}

/// Arguments as an object for providers that take structured input
pub(crate) fn arguments_object(arguments: &Value) -> Value {
    match arguments {
        Value::Object(_) => arguments.clone(),
        Value::Null => json!({}),
        Value::String(s) if s.trim().is_empty() => json!({}),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(parsed @ Value::Object(_)) => parsed,
            _ => json!({ "value": s }),
        },
        other => json!({ "value": other }),
    }
}

/// Collects a vendor response's fragments in order
///
/// Text and images land in both `output_text` and `content_parts`; the
/// parts are only kept when an image was seen, so text-only answers stay
/// plain.
#[derive(Debug, Default)]
pub(crate) struct OutputAssembler {
    text: String,
    parts: Vec<ContentPart>,
    reasoning: Vec<String>,
    calls: Vec<ToolCall>,
    has_image: bool,
}

impl OutputAssembler {
    pub(crate) fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.text.push_str(text);
        self.parts.push(ContentPart::Text { text: text.to_owned() });
    }

    pub(crate) fn push_image(&mut self, media_type: &str, data: &str) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        self.text.push_str(IMAGE_PLACEHOLDER);
        self.parts.push(ContentPart::image_base64(media_type, data));
        self.has_image = true;
    }

    pub(crate) fn push_reasoning(&mut self, text: &str) {
        if !text.trim().is_empty() {
            self.reasoning.push(text.to_owned());
        }
    }

    pub(crate) fn push_call(&mut self, call: ToolCall) {
        self.calls.push(call);
    }

    pub(crate) fn finish(self, id: String, model: String, usage: Usage) -> LlmResponse {
        let reasoning = (!self.reasoning.is_empty()).then(|| self.reasoning.join("\n"));
        let parts = if self.has_image { self.parts } else { Vec::new() };

        LlmResponse::new(id, model, self.text, self.calls, usage)
            .with_reasoning(reasoning)
            .with_content_parts(parts)
    }
}
