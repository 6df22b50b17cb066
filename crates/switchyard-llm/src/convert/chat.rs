//! Conversion between canonical types and OpenAI-compatible Chat Completions

use serde_json::{Value, json};
use switchyard_core::{Error, ProviderKind, Result};

use super::{OutputAssembler, tool_result_fallback};
use crate::protocol::chat::{
    ChatContent, ChatFunction, ChatImageUrl, ChatMessage, ChatPart, ChatRequest, ChatResponse, ChatTool,
};
use crate::types::{ConversationItem, CreateResponseRequest, ImageAttachment, LlmResponse, Role, ToolCall, ToolChoice, Usage};

impl From<&CreateResponseRequest> for ChatRequest {
    fn from(request: &CreateResponseRequest) -> Self {
        let mut messages = Vec::new();
        let mut tool_result_turns = Vec::new();

        for item in request.all_items() {
            match item {
                ConversationItem::Message(message) => messages.push(ChatMessage {
                    role: role_name(message.role),
                    content: ChatContent::Text(message.content.clone()),
                }),
                ConversationItem::FunctionCallOutput(output) => {
                    tool_result_turns.push(messages.len());
                    messages.push(ChatMessage {
                        role: "user",
                        content: ChatContent::Text(tool_result_fallback(&output.output)),
                    });
                }
            }
        }

        attach_images(&mut messages, &tool_result_turns, &request.images);

        let effective = request.tool_choice.effective(&request.tools);
        // With a tool result in hand, an open choice would just invite another call
        let answer_now = request.has_function_output() && effective == ToolChoice::Auto;

        let (tools, tool_choice) = if request.tools.is_empty() || answer_now {
            (Vec::new(), None)
        } else {
            let tools = request
                .tools
                .iter()
                .map(|tool| ChatTool {
                    tool_type: "function",
                    function: ChatFunction {
                        name: tool.name.clone(),
                        description: tool.description.clone(),
                        parameters: tool.parameters.clone(),
                    },
                })
                .collect();
            (tools, tool_choice(&effective))
        };

        Self {
            model: request.model.clone(),
            messages,
            tools,
            tool_choice,
            temperature: request.params.temperature,
            top_p: request.params.top_p,
            max_tokens: request.params.max_tokens,
        }
    }
}

const fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn tool_choice(choice: &ToolChoice) -> Option<Value> {
    match choice {
        ToolChoice::Auto => None,
        ToolChoice::Required => Some(json!("required")),
        ToolChoice::None => Some(json!("none")),
        ToolChoice::Named(name) => Some(json!({"type": "function", "function": {"name": name}})),
    }
}

fn attach_images(messages: &mut Vec<ChatMessage>, tool_result_turns: &[usize], images: &[ImageAttachment]) {
    if images.is_empty() {
        return;
    }

    let image_parts = images.iter().map(|image| ChatPart::ImageUrl {
        image_url: ChatImageUrl { url: image.data_url() },
    });

    let target = messages
        .iter_mut()
        .enumerate()
        .rev()
        .find(|(index, m)| m.role == "user" && !tool_result_turns.contains(index))
        .map(|(_, m)| m);

    match target {
        Some(message) => {
            let mut parts = match std::mem::replace(&mut message.content, ChatContent::Parts(Vec::new())) {
                ChatContent::Text(text) => vec![ChatPart::Text { text }],
                ChatContent::Parts(parts) => parts,
            };
            parts.extend(image_parts);
            message.content = ChatContent::Parts(parts);
        }
        None => messages.push(ChatMessage {
            role: "user",
            content: ChatContent::Parts(image_parts.collect()),
        }),
    }
}

/// Map a Chat Completions body onto the canonical response
pub fn from_wire(wire: ChatResponse, provider: ProviderKind, requested_model: &str) -> Result<LlmResponse> {
    let Some(choice) = wire.choices.into_iter().next() else {
        return Err(Error::Llm(format!("{provider} returned no choices")));
    };

    let mut out = OutputAssembler::default();
    let message = choice.message;
    if let Some(reasoning) = message.reasoning_content {
        out.push_reasoning(&reasoning);
    }
    if let Some(content) = message.content {
        out.push_text(&content);
    }
    for call in message.tool_calls.unwrap_or_default() {
        out.push_call(ToolCall::new(call.id, call.function.name, &call.function.arguments));
    }

    let usage = wire.usage.map_or_else(Usage::default, |u| {
        Usage::from_counts(u.prompt_tokens, u.completion_tokens, u.total_tokens)
    });

    Ok(out.finish(
        wire.id.unwrap_or_else(|| format!("{provider}-unknown")),
        wire.model.unwrap_or_else(|| requested_model.to_owned()),
        usage,
    ))
}
