use serde::{Deserialize, Serialize};

/// Speaker of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    /// Gemini-style `model` is accepted as an alias
    #[serde(alias = "model")]
    Assistant,
}

/// A plain role-tagged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageItem {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
enum FunctionCallOutputTag {
    #[default]
    #[serde(rename = "function_call_output")]
    FunctionCallOutput,
}

/// Result of a tool call, correlated to the call by `call_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallOutput {
    #[serde(rename = "type")]
    tag: FunctionCallOutputTag,
    pub call_id: String,
    /// Tool result, JSON-encoded
    pub output: String,
}

/// One entry of model input or replayed history
///
/// Serializes to the persisted shape: `{"role", "content"}` for messages
/// and `{"type": "function_call_output", "call_id", "output"}` for tool
/// results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConversationItem {
    FunctionCallOutput(FunctionCallOutput),
    Message(MessageItem),
}

impl ConversationItem {
    pub fn message(role: Role, content: impl Into<String>) -> Self {
        Self::Message(MessageItem {
            role,
            content: content.into(),
        })
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::message(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::message(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::message(Role::Assistant, content)
    }

    pub fn function_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self::FunctionCallOutput(FunctionCallOutput {
            tag: FunctionCallOutputTag::FunctionCallOutput,
            call_id: call_id.into(),
            output: output.into(),
        })
    }

    pub const fn is_function_output(&self) -> bool {
        matches!(self, Self::FunctionCallOutput(_))
    }

    /// Text carried by the item, used for token estimation
    pub fn text(&self) -> &str {
        match self {
            Self::Message(m) => &m.content,
            Self::FunctionCallOutput(o) => &o.output,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn function_output_serializes_with_type_tag() {
        let item = ConversationItem::function_output("call_1", "[{\"total\":42}]");
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(
            value,
            json!({"type": "function_call_output", "call_id": "call_1", "output": "[{\"total\":42}]"})
        );
    }

    #[test]
    fn deserializes_both_shapes() {
        let items: Vec<ConversationItem> = serde_json::from_value(json!([
            {"role": "user", "content": "hi"},
            {"role": "model", "content": "hello"},
            {"type": "function_call_output", "call_id": "c1", "output": "{}"}
        ]))
        .unwrap();

        assert_eq!(items[0], ConversationItem::user("hi"));
        assert_eq!(items[1], ConversationItem::assistant("hello"));
        assert!(items[2].is_function_output());
    }

    #[test]
    fn assistant_serializes_as_assistant() {
        let value = serde_json::to_value(ConversationItem::assistant("ok")).unwrap();
        assert_eq!(value["role"], "assistant");
    }
}
