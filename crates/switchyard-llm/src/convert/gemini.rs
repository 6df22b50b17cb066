//! Conversion between canonical types and the Gemini `generateContent` API

use serde_json::{Value, json};
use switchyard_core::{Error, Result};
use uuid::Uuid;

use super::{OutputAssembler, arguments_object, parse_output, tool_result_fallback};
use crate::protocol::gemini::{
    GeminiBlob, GeminiContent, GeminiFunctionCall, GeminiFunctionCallingConfig, GeminiFunctionDeclaration,
    GeminiFunctionResponse, GeminiGenerationConfig, GeminiPart, GeminiRequest, GeminiResponse, GeminiTool,
    GeminiToolConfig,
};
use crate::tool_cache::ToolCallCache;
use crate::types::{
    ConversationItem, CreateResponseRequest, ImageAttachment, LlmResponse, Role, SamplingParams, ToolCall, ToolChoice,
    ToolSpec, Usage,
};

/// Schema keywords the function declaration format rejects
const UNSUPPORTED_SCHEMA_KEYS: &[&str] = &["additionalProperties", "strict"];

/// Build the wire request, replaying cached `functionCall` parts
pub fn build_request(request: &CreateResponseRequest, cache: &ToolCallCache) -> GeminiRequest {
    let mut system = Vec::new();
    let mut contents: Vec<GeminiContent> = Vec::new();
    let mut open_pair: Option<usize> = None;

    for item in request.all_items() {
        match item {
            ConversationItem::Message(message) => {
                open_pair = None;
                if message.content.trim().is_empty() {
                    continue;
                }
                match message.role {
                    Role::System => system.push(GeminiPart::text(&message.content)),
                    Role::User => contents.push(content("user", vec![GeminiPart::text(&message.content)])),
                    Role::Assistant => contents.push(content("model", vec![GeminiPart::text(&message.content)])),
                }
            }
            ConversationItem::FunctionCallOutput(output) => {
                let Some(call) = cache.recall(&output.call_id) else {
                    tracing::debug!(call_id = %output.call_id, "no cached functionCall, sending tool result as text");
                    open_pair = None;
                    contents.push(content(
                        "user",
                        vec![GeminiPart::text(tool_result_fallback(&output.output))],
                    ));
                    continue;
                };

                let call_part = GeminiPart {
                    function_call: Some(GeminiFunctionCall {
                        id: None,
                        name: call.name.clone(),
                        args: arguments_object(&call.arguments),
                    }),
                    ..GeminiPart::default()
                };
                let response_part = GeminiPart {
                    function_response: Some(GeminiFunctionResponse {
                        name: call.name,
                        response: response_object(&output.output),
                    }),
                    ..GeminiPart::default()
                };

                match open_pair {
                    Some(index) if index + 1 < contents.len() => {
                        contents[index].parts.push(call_part);
                        contents[index + 1].parts.push(response_part);
                    }
                    _ => {
                        open_pair = Some(contents.len());
                        contents.push(content("model", vec![call_part]));
                        contents.push(content("user", vec![response_part]));
                    }
                }
            }
        }
    }

    attach_images(&mut contents, &request.images);

    let (tools, tool_config) = if request.tools.is_empty() {
        (Vec::new(), None)
    } else {
        let declarations = request.tools.iter().map(declaration).collect();
        let config = calling_config(&request.tool_choice.effective(&request.tools));
        (
            vec![GeminiTool {
                function_declarations: declarations,
            }],
            Some(GeminiToolConfig {
                function_calling_config: config,
            }),
        )
    };

    GeminiRequest {
        contents,
        system_instruction: (!system.is_empty()).then(|| GeminiContent {
            role: None,
            parts: system,
        }),
        tools,
        tool_config,
        generation_config: generation_config(request.params),
    }
}

fn content(role: &str, parts: Vec<GeminiPart>) -> GeminiContent {
    GeminiContent {
        role: Some(role.to_owned()),
        parts,
    }
}

/// `functionResponse.response` must be an object
fn response_object(output: &str) -> Value {
    match parse_output(output) {
        object @ Value::Object(_) => object,
        other => json!({ "result": other }),
    }
}

fn declaration(tool: &ToolSpec) -> GeminiFunctionDeclaration {
    let mut parameters = tool.parameters.clone();
    strip_unsupported(&mut parameters);
    GeminiFunctionDeclaration {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters,
    }
}

fn strip_unsupported(schema: &mut Value) {
    match schema {
        Value::Object(map) => {
            for key in UNSUPPORTED_SCHEMA_KEYS {
                map.remove(*key);
            }
            map.values_mut().for_each(strip_unsupported);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_unsupported),
        _ => {}
    }
}

fn calling_config(choice: &ToolChoice) -> GeminiFunctionCallingConfig {
    let (mode, allowed) = match choice {
        ToolChoice::Auto => ("AUTO", None),
        ToolChoice::Required => ("ANY", None),
        ToolChoice::None => ("NONE", None),
        ToolChoice::Named(name) => ("ANY", Some(vec![name.clone()])),
    };
    GeminiFunctionCallingConfig {
        mode,
        allowed_function_names: allowed,
    }
}

fn generation_config(params: SamplingParams) -> Option<GeminiGenerationConfig> {
    if params == SamplingParams::default() {
        return None;
    }
    Some(GeminiGenerationConfig {
        temperature: params.temperature,
        top_p: params.top_p,
        max_output_tokens: params.max_tokens,
    })
}

/// Images go on the last user turn that carries no function response
fn attach_images(contents: &mut Vec<GeminiContent>, images: &[ImageAttachment]) {
    if images.is_empty() {
        return;
    }

    let parts = images.iter().map(|image| GeminiPart {
        inline_data: Some(GeminiBlob {
            mime_type: image.mime_type().to_owned(),
            data: image.base64.clone(),
        }),
        ..GeminiPart::default()
    });

    let target = contents.iter_mut().rev().find(|c| {
        c.role.as_deref() == Some("user") && c.parts.iter().all(|p| p.function_response.is_none())
    });

    match target {
        Some(turn) => turn.parts.extend(parts),
        None => contents.push(content("user", parts.collect())),
    }
}

/// Map a `generateContent` body onto the canonical response
///
/// Calls without an id get a synthesized `call_<uuid>` and are remembered
/// under it.
pub fn from_wire(wire: GeminiResponse, requested_model: &str, cache: &ToolCallCache) -> Result<LlmResponse> {
    let Some(candidate) = wire.candidates.into_iter().next() else {
        return Err(Error::Llm("gemini returned no candidates".to_owned()));
    };

    let mut out = OutputAssembler::default();
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if let Some(text) = part.text {
            if part.thought == Some(true) {
                out.push_reasoning(&text);
            } else {
                out.push_text(&text);
            }
        }
        if let Some(blob) = part.inline_data {
            out.push_image(&blob.mime_type, &blob.data);
        }
        if let Some(call) = part.function_call {
            let call_id = call
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("call_{}", Uuid::new_v4().simple()));
            cache.remember(&call_id, &call.name, call.args.clone());
            out.push_call(ToolCall::new(call_id, call.name, &call.args));
        }
    }

    let usage = wire.usage_metadata.map_or_else(Usage::default, |u| {
        Usage::from_counts(u.prompt_token_count, u.candidates_token_count, u.total_token_count)
    });

    Ok(out.finish(
        wire.response_id.unwrap_or_else(|| format!("gemini-{}", Uuid::new_v4())),
        wire.model_version.unwrap_or_else(|| requested_model.to_owned()),
        usage,
    ))
}
