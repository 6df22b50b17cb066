//! Conversion between canonical types and the Anthropic Messages API
//!
//! Anthropic has no server-side conversation state, so history always
//! arrives replayed and a `previous_response_id` is ignored.

use super::{OutputAssembler, arguments_object, tool_result_fallback};
use crate::protocol::anthropic::{
    AnthropicBlock, AnthropicImageSource, AnthropicMessage, AnthropicRequest, AnthropicResponse, AnthropicResponseBlock,
    AnthropicTool, AnthropicToolChoice,
};
use crate::tool_cache::ToolCallCache;
use crate::types::{ConversationItem, CreateResponseRequest, ImageAttachment, LlmResponse, Role, ToolCall, ToolChoice, Usage};

/// Default max tokens when not specified (Anthropic requires this field)
const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Build the wire request, replaying cached `tool_use` blocks
pub fn build_request(request: &CreateResponseRequest, cache: &ToolCallCache) -> AnthropicRequest {
    let mut system = Vec::new();
    let mut messages: Vec<AnthropicMessage> = Vec::new();
    // Index of the assistant message of the tool pair still accepting calls
    let mut open_pair: Option<usize> = None;

    for item in request.all_items() {
        match item {
            ConversationItem::Message(message) => {
                open_pair = None;
                if message.content.trim().is_empty() {
                    continue;
                }
                match message.role {
                    Role::System => system.push(message.content.clone()),
                    Role::User => messages.push(text_message("user", &message.content)),
                    Role::Assistant => messages.push(text_message("assistant", &message.content)),
                }
            }
            ConversationItem::FunctionCallOutput(output) => {
                let Some(call) = cache.recall(&output.call_id) else {
                    tracing::debug!(call_id = %output.call_id, "no cached tool_use, sending tool result as text");
                    open_pair = None;
                    messages.push(text_message("user", &tool_result_fallback(&output.output)));
                    continue;
                };

                let tool_use = AnthropicBlock::ToolUse {
                    id: output.call_id.clone(),
                    name: call.name,
                    input: arguments_object(&call.arguments),
                };
                let tool_result = AnthropicBlock::ToolResult {
                    tool_use_id: output.call_id.clone(),
                    content: output.output.clone(),
                };

                match open_pair {
                    Some(index) if index + 1 < messages.len() => {
                        messages[index].content.push(tool_use);
                        messages[index + 1].content.push(tool_result);
                    }
                    _ => {
                        open_pair = Some(messages.len());
                        messages.push(AnthropicMessage {
                            role: "assistant",
                            content: vec![tool_use],
                        });
                        messages.push(AnthropicMessage {
                            role: "user",
                            content: vec![tool_result],
                        });
                    }
                }
            }
        }
    }

    attach_images(&mut messages, &request.images);

    let effective = request.tool_choice.effective(&request.tools);
    let (tools, tool_choice) = if request.tools.is_empty() || effective == ToolChoice::None {
        (Vec::new(), None)
    } else {
        let tools = request
            .tools
            .iter()
            .map(|tool| AnthropicTool {
                name: tool.name.clone(),
                description: tool.description.clone(),
                input_schema: tool.parameters.clone(),
            })
            .collect();
        (tools, Some(tool_choice(&effective)))
    };

    AnthropicRequest {
        model: request.model.clone(),
        max_tokens: request.params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        system: (!system.is_empty()).then(|| system.join("\n")),
        messages,
        temperature: request.params.temperature,
        top_p: request.params.top_p,
        tools,
        tool_choice,
    }
}

fn text_message(role: &'static str, text: &str) -> AnthropicMessage {
    AnthropicMessage {
        role,
        content: vec![AnthropicBlock::Text { text: text.to_owned() }],
    }
}

fn tool_choice(choice: &ToolChoice) -> AnthropicToolChoice {
    match choice {
        ToolChoice::Required => AnthropicToolChoice {
            choice_type: "any",
            name: None,
        },
        ToolChoice::Named(name) => AnthropicToolChoice {
            choice_type: "tool",
            name: Some(name.clone()),
        },
        ToolChoice::Auto | ToolChoice::None => AnthropicToolChoice {
            choice_type: "auto",
            name: None,
        },
    }
}

/// Images go on the last user turn that is not a tool result
fn attach_images(messages: &mut Vec<AnthropicMessage>, images: &[ImageAttachment]) {
    if images.is_empty() {
        return;
    }

    let blocks = images.iter().map(|image| AnthropicBlock::Image {
        source: AnthropicImageSource {
            source_type: "base64",
            media_type: image.mime_type().to_owned(),
            data: image.base64.clone(),
        },
    });

    let target = messages.iter_mut().rev().find(|m| {
        m.role == "user" && !m.content.iter().any(|b| matches!(b, AnthropicBlock::ToolResult { .. }))
    });

    match target {
        Some(message) => message.content.extend(blocks),
        None => messages.push(AnthropicMessage {
            role: "user",
            content: blocks.collect(),
        }),
    }
}

/// Map a Messages API body onto the canonical response
///
/// Every `tool_use` block is remembered so the matching result can be
/// paired with it on the next round.
pub fn from_wire(wire: AnthropicResponse, requested_model: &str, cache: &ToolCallCache) -> LlmResponse {
    let mut out = OutputAssembler::default();

    for block in wire.content {
        match block {
            AnthropicResponseBlock::Text { text } => out.push_text(&text),
            AnthropicResponseBlock::Thinking { thinking } => out.push_reasoning(&thinking),
            AnthropicResponseBlock::ToolUse { id, name, input } => {
                cache.remember(&id, &name, input.clone());
                out.push_call(ToolCall::new(id, name, &input));
            }
            AnthropicResponseBlock::Other => {}
        }
    }

    let usage = wire.usage.map_or_else(Usage::default, |u| {
        Usage::from_counts(u.input_tokens, u.output_tokens, None)
    });

    out.finish(
        wire.id.unwrap_or_else(|| "anthropic-unknown".to_owned()),
        wire.model.unwrap_or_else(|| requested_model.to_owned()),
        usage,
    )
}
