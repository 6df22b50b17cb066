//! Conversion between canonical types and the Responses API

use serde_json::{Value, json};
use switchyard_core::ProviderKind;

use super::OutputAssembler;
use crate::protocol::responses::{
    ResponsesContent, ResponsesInputItem, ResponsesInputPart, ResponsesOutputContent, ResponsesOutputItem,
    ResponsesRequest, ResponsesResponse, ResponsesTool,
};
use crate::types::{ConversationItem, CreateResponseRequest, ImageAttachment, LlmResponse, Role, ToolCall, ToolChoice, Usage};

impl From<&CreateResponseRequest> for ResponsesRequest {
    fn from(request: &CreateResponseRequest) -> Self {
        let mut input: Vec<ResponsesInputItem> = request.all_items().map(input_item).collect();
        attach_images(&mut input, &request.images);

        let tools = request
            .tools
            .iter()
            .map(|tool| ResponsesTool {
                tool_type: "function",
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
                strict: tool.strict,
            })
            .collect::<Vec<_>>();

        let tool_choice = if tools.is_empty() {
            None
        } else {
            tool_choice(&request.tool_choice.effective(&request.tools))
        };

        Self {
            model: request.model.clone(),
            input,
            previous_response_id: request.continuation.previous_response_id().map(str::to_owned),
            tools,
            tool_choice,
            temperature: request.params.temperature,
            top_p: request.params.top_p,
            max_output_tokens: request.params.max_tokens,
            text: request.text.clone(),
        }
    }
}

fn input_item(item: &ConversationItem) -> ResponsesInputItem {
    match item {
        ConversationItem::Message(message) => ResponsesInputItem::Message {
            role: role_name(message.role).to_owned(),
            content: ResponsesContent::Text(message.content.clone()),
        },
        ConversationItem::FunctionCallOutput(output) => ResponsesInputItem::FunctionCallOutput {
            item_type: "function_call_output",
            call_id: output.call_id.clone(),
            output: output.output.clone(),
        },
    }
}

const fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/// Images go on the last user message, which becomes a parts list
fn attach_images(input: &mut Vec<ResponsesInputItem>, images: &[ImageAttachment]) {
    if images.is_empty() {
        return;
    }

    let image_parts = images
        .iter()
        .map(|image| ResponsesInputPart::InputImage {
            image_url: image.data_url(),
        });

    let last_user = input
        .iter_mut()
        .rev()
        .find_map(|item| match item {
            ResponsesInputItem::Message { role, content } if role == "user" => Some(content),
            _ => None,
        });

    match last_user {
        Some(content) => {
            let mut parts = match std::mem::replace(content, ResponsesContent::Parts(Vec::new())) {
                ResponsesContent::Text(text) => vec![ResponsesInputPart::InputText { text }],
                ResponsesContent::Parts(parts) => parts,
            };
            parts.extend(image_parts);
            *content = ResponsesContent::Parts(parts);
        }
        None => input.push(ResponsesInputItem::Message {
            role: "user".to_owned(),
            content: ResponsesContent::Parts(image_parts.collect()),
        }),
    }
}

fn tool_choice(choice: &ToolChoice) -> Option<Value> {
    match choice {
        ToolChoice::Auto => None,
        ToolChoice::Required => Some(json!("required")),
        ToolChoice::None => Some(json!("none")),
        ToolChoice::Named(name) => Some(json!({"type": "function", "name": name})),
    }
}

/// Map a Responses API body onto the canonical response
pub fn from_wire(wire: ResponsesResponse, provider: ProviderKind, requested_model: &str) -> LlmResponse {
    let mut out = OutputAssembler::default();

    for item in wire.output {
        match item {
            ResponsesOutputItem::Message { content } => {
                for part in content {
                    if let ResponsesOutputContent::OutputText { text } = part {
                        out.push_text(&text);
                    }
                }
            }
            ResponsesOutputItem::FunctionCall { call_id, name, arguments } => {
                out.push_call(ToolCall::new(call_id, name, &arguments));
            }
            ResponsesOutputItem::Reasoning { summary, content } => {
                for fragment in summary.iter().chain(content.iter()) {
                    out.push_reasoning(&fragment.text);
                }
            }
            ResponsesOutputItem::ImageGenerationCall { result: Some(data) } => {
                out.push_image("image/png", &data);
            }
            ResponsesOutputItem::ImageGenerationCall { result: None } | ResponsesOutputItem::Other => {}
        }
    }

    let usage = wire.usage.map_or_else(Usage::default, |u| {
        Usage::from_counts(u.input_tokens, u.output_tokens, u.total_tokens)
    });

    out.finish(
        wire.id.unwrap_or_else(|| format!("{provider}-unknown")),
        wire.model.unwrap_or_else(|| requested_model.to_owned()),
        usage,
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::{Continuation, ResponseStatus, ToolSpec};

    fn sql_tool() -> ToolSpec {
        ToolSpec {
            name: "iat_sql_query".into(),
            description: "Run SQL".into(),
            parameters: json!({"type": "object", "properties": {}}),
            strict: true,
        }
    }

    #[test]
    fn request_forwards_previous_response_id_and_outputs() {
        let request = CreateResponseRequest::new(
            "gpt-5",
            vec![
                ConversationItem::user("how many?"),
                ConversationItem::function_output("call_sql_1", "[{\"total\":42}]"),
            ],
        )
        .with_continuation(Continuation::PreviousResponse("resp_1".into()))
        .with_tools(vec![sql_tool()], ToolChoice::Auto);

        let wire = serde_json::to_value(ResponsesRequest::from(&request)).unwrap();

        assert_eq!(wire["previous_response_id"], "resp_1");
        assert_eq!(wire["input"][0], json!({"role": "user", "content": "how many?"}));
        assert_eq!(wire["input"][1]["type"], "function_call_output");
        assert_eq!(wire["input"][1]["call_id"], "call_sql_1");
        assert_eq!(wire["tools"][0]["type"], "function");
        assert!(wire.get("tool_choice").is_none());
    }

    #[test]
    fn non_auto_tool_choice_is_sent() {
        let request = CreateResponseRequest::new("gpt-5", vec![ConversationItem::user("q")])
            .with_tools(vec![sql_tool()], ToolChoice::Named("iat_sql_query".into()));
        let wire = serde_json::to_value(ResponsesRequest::from(&request)).unwrap();
        assert_eq!(wire["tool_choice"], json!({"type": "function", "name": "iat_sql_query"}));

        let request = CreateResponseRequest::new("gpt-5", vec![ConversationItem::user("q")])
            .with_tools(vec![sql_tool()], ToolChoice::Required);
        let wire = serde_json::to_value(ResponsesRequest::from(&request)).unwrap();
        assert_eq!(wire["tool_choice"], "required");
    }

    #[test]
    fn images_attach_to_last_user_message() {
        let request = CreateResponseRequest::new(
            "gpt-5",
            vec![ConversationItem::user("first"), ConversationItem::user("look at this")],
        )
        .with_images(vec![ImageAttachment::new("chart.png", "AAA")]);

        let wire = serde_json::to_value(ResponsesRequest::from(&request)).unwrap();
        assert_eq!(wire["input"][0]["content"], "first");
        let parts = &wire["input"][1]["content"];
        assert_eq!(parts[0], json!({"type": "input_text", "text": "look at this"}));
        assert_eq!(parts[1], json!({"type": "input_image", "image_url": "data:image/png;base64,AAA"}));
    }

    #[test]
    fn response_with_text_reasoning_and_call() {
        let wire: ResponsesResponse = serde_json::from_value(json!({
            "id": "resp_openai_1",
            "model": "gpt-5",
            "output": [
                {"type": "reasoning", "summary": [{"type": "summary_text", "text": "think"}]},
                {"type": "function_call", "call_id": "call_sql_1", "name": "iat_sql_query",
                 "arguments": "{\"database_key\":\"main_db\",\"query\":\"SELECT 42 AS total\"}"},
                {"type": "web_search_call", "id": "ws_1"}
            ],
            "usage": {"input_tokens": 100, "output_tokens": 25, "total_tokens": 125}
        }))
        .unwrap();

        let response = from_wire(wire, ProviderKind::OpenAi, "gpt-5");
        assert_eq!(response.id(), "resp_openai_1");
        assert_eq!(response.status(), ResponseStatus::ToolCalls);
        assert_eq!(response.output()[0].arguments_map()["query"], "SELECT 42 AS total");
        assert_eq!(response.reasoning_content(), Some("think"));
        assert_eq!(response.usage().total_tokens, 125);
    }

    #[test]
    fn missing_usage_and_id_default() {
        let wire: ResponsesResponse = serde_json::from_value(json!({
            "output": [{"type": "message", "content": [{"type": "output_text", "text": "Hi"}]}]
        }))
        .unwrap();

        let response = from_wire(wire, ProviderKind::Xai, "grok-4");
        assert_eq!(response.id(), "xai-unknown");
        assert_eq!(response.model(), "grok-4");
        assert_eq!(response.output_text(), "Hi");
        assert_eq!(response.usage(), Usage::default());
        assert_eq!(response.status(), ResponseStatus::Completed);
    }

    #[test]
    fn generated_image_becomes_content_part() {
        let wire: ResponsesResponse = serde_json::from_value(json!({
            "id": "resp_img",
            "output": [
                {"type": "image_generation_call", "result": "iVBORw0"},
                {"type": "message", "content": [{"type": "output_text", "text": "Done"}]}
            ]
        }))
        .unwrap();

        let response = from_wire(wire, ProviderKind::OpenAi, "gpt-5");
        let parts = response.content_parts().unwrap();
        assert_eq!(parts.len(), 2);
        assert!(response.output_text().contains(crate::types::IMAGE_PLACEHOLDER));
        assert_eq!(response.status(), ResponseStatus::Completed);
    }
}
