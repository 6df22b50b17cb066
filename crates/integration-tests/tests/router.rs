//! Provider routing through `LlmProxy` against the mock vendor

mod harness;

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::StatusCode;
use harness::config::{COMPANY, COMPANY_KEY, ConfigBuilder, secrets};
use harness::mock_vendor::{self, MockVendor, Route};
use serde_json::json;
use switchyard_config::Config;
use switchyard_core::{ErrorKind, ProviderKind};
use switchyard_llm::{
    ClientCache, ConversationItem, CreateResponseRequest, LengthEstimate, LlmGateway, LlmProxy, ResponseStatus,
    ToolChoice, ToolSpec,
};

fn proxy(config: Config, secrets: HashMap<String, String>) -> LlmProxy {
    let config = Arc::new(config);
    LlmProxy::new(
        &config.llm,
        Arc::clone(&config) as _,
        Arc::new(secrets),
        Arc::new(ClientCache::new()),
    )
    .with_token_counter(Arc::new(LengthEstimate))
}

fn lookup_tool() -> ToolSpec {
    ToolSpec {
        name: "lookup_order".to_owned(),
        description: "Look up one order".to_owned(),
        parameters: json!({"type": "object", "properties": {"order_id": {"type": "integer"}}}),
        strict: false,
    }
}

fn ask(model: &str, question: &str) -> CreateResponseRequest {
    CreateResponseRequest::new(model, vec![ConversationItem::user(question)])
}

#[tokio::test]
async fn responses_adapter_answers_plain_question() {
    let mock = MockVendor::start().await.unwrap();
    mock.reply(Route::Responses, mock_vendor::responses_text("resp_1", "Hello from gpt"));
    let proxy = proxy(ConfigBuilder::new(&mock).build(), secrets());

    let response = proxy.create_response(COMPANY, &ask("gpt-5", "hi")).await.unwrap();

    assert_eq!(response.id(), "resp_1");
    assert_eq!(response.status(), ResponseStatus::Completed);
    assert_eq!(response.output_text(), "Hello from gpt");
    assert!(response.output().is_empty());
    assert_eq!(response.usage().total_tokens, 16);

    let recorded = mock.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(
        recorded[0].headers["authorization"].to_str().unwrap(),
        format!("Bearer {COMPANY_KEY}")
    );
    assert_eq!(recorded[0].body["model"], "gpt-5");
    assert_eq!(recorded[0].body["input"][0], json!({"role": "user", "content": "hi"}));
}

#[tokio::test]
async fn responses_adapter_reports_tool_calls() {
    let mock = MockVendor::start().await.unwrap();
    mock.reply(
        Route::Responses,
        mock_vendor::responses_call("resp_2", "call_1", "lookup_order", &json!({"order_id": 15})),
    );
    let proxy = proxy(ConfigBuilder::new(&mock).build(), secrets());

    let request = ask("gpt-5", "where is order 15?").with_tools(vec![lookup_tool()], ToolChoice::Auto);
    let response = proxy.create_response(COMPANY, &request).await.unwrap();

    assert_eq!(response.status(), ResponseStatus::ToolCalls);
    let call = &response.output()[0];
    assert_eq!(call.call_id, "call_1");
    assert_eq!(call.name, "lookup_order");
    assert_eq!(call.arguments_map()["order_id"], 15);

    let body = &mock.bodies(Route::Responses)[0];
    assert_eq!(body["tools"][0]["name"], "lookup_order");
    assert!(body.get("tool_choice").is_none());
}

#[tokio::test]
async fn anthropic_rebuilds_tool_pair_from_cached_call() {
    let mock = MockVendor::start().await.unwrap();
    mock.reply(
        Route::Messages,
        mock_vendor::anthropic_tool_use("toolu_1", "lookup_order", &json!({"order_id": 15})),
    )
    .reply(Route::Messages, mock_vendor::anthropic_text("Order 15 shipped."));
    let proxy = proxy(ConfigBuilder::new(&mock).build(), secrets());

    let first = ask("claude-sonnet-4", "where is order 15?").with_tools(vec![lookup_tool()], ToolChoice::Auto);
    let response = proxy.create_response(COMPANY, &first).await.unwrap();
    assert_eq!(response.output()[0].call_id, "toolu_1");

    let second = CreateResponseRequest::new(
        "claude-sonnet-4",
        vec![
            ConversationItem::user("where is order 15?"),
            ConversationItem::function_output("toolu_1", r#"{"status":"shipped"}"#),
        ],
    )
    .with_tools(vec![lookup_tool()], ToolChoice::Auto);
    let response = proxy.create_response(COMPANY, &second).await.unwrap();
    assert_eq!(response.output_text(), "Order 15 shipped.");

    let recorded = mock.recorded();
    assert_eq!(recorded[1].headers["x-api-key"].to_str().unwrap(), COMPANY_KEY);
    assert!(recorded[1].headers.contains_key("anthropic-version"));

    let messages = recorded[1].body["messages"].as_array().unwrap().clone();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"][0]["type"], "tool_use");
    assert_eq!(messages[1]["content"][0]["id"], "toolu_1");
    assert_eq!(messages[1]["content"][0]["input"], json!({"order_id": 15}));
    assert_eq!(messages[2]["content"][0]["type"], "tool_result");
    assert_eq!(messages[2]["content"][0]["tool_use_id"], "toolu_1");
}

#[tokio::test]
async fn unknown_call_id_falls_back_to_text_result() {
    let mock = MockVendor::start().await.unwrap();
    mock.reply(Route::Messages, mock_vendor::anthropic_text("Noted."));
    let proxy = proxy(ConfigBuilder::new(&mock).build(), secrets());

    let request = CreateResponseRequest::new(
        "claude-sonnet-4",
        vec![
            ConversationItem::user("where is order 15?"),
            ConversationItem::function_output("toolu_lost", "42"),
        ],
    );
    let response = proxy.create_response(COMPANY, &request).await.unwrap();
    assert_eq!(response.output_text(), "Noted.");

    let body = &mock.bodies(Route::Messages)[0];
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["content"][0]["text"], "Tool result:\n42");
}

#[tokio::test]
async fn gemini_function_call_is_normalized() {
    let mock = MockVendor::start().await.unwrap();
    mock.reply(
        Route::GenerateContent,
        mock_vendor::gemini_call("lookup_order", &json!({"order_id": 15})),
    );
    let proxy = proxy(ConfigBuilder::new(&mock).build(), secrets());

    let request = ask("gemini-2.5-pro", "where is order 15?").with_tools(vec![lookup_tool()], ToolChoice::Auto);
    let response = proxy.create_response(COMPANY, &request).await.unwrap();

    assert_eq!(response.status(), ResponseStatus::ToolCalls);
    assert_eq!(response.output()[0].name, "lookup_order");
    assert!(!response.output()[0].call_id.is_empty());

    let recorded = mock.recorded();
    assert_eq!(recorded[0].path, "/v1beta/models/gemini-2.5-pro:generateContent");
    assert_eq!(recorded[0].headers["x-goog-api-key"].to_str().unwrap(), COMPANY_KEY);
    assert_eq!(recorded[0].body["contents"][0]["role"], "user");
    assert_eq!(
        recorded[0].body["tools"][0]["functionDeclarations"][0]["name"],
        "lookup_order"
    );
}

#[tokio::test]
async fn chat_completions_serves_deepseek() {
    let mock = MockVendor::start().await.unwrap();
    mock.reply(Route::ChatCompletions, mock_vendor::chat_text("Hi from deepseek"));
    let proxy = proxy(ConfigBuilder::new(&mock).build(), secrets());

    let response = proxy.create_response(COMPANY, &ask("deepseek-chat", "hi")).await.unwrap();

    assert_eq!(response.output_text(), "Hi from deepseek");
    assert_eq!(response.usage().input_tokens, 10);
    assert_eq!(response.usage().output_tokens, 5);

    let body = &mock.bodies(Route::ChatCompletions)[0];
    assert_eq!(body["messages"][0], json!({"role": "user", "content": "hi"}));
}

#[tokio::test]
async fn vendor_error_status_is_llm_error() {
    let mock = MockVendor::start().await.unwrap();
    mock.reply_with_status(
        Route::Responses,
        StatusCode::TOO_MANY_REQUESTS,
        json!({"error": {"message": "slow down", "type": "rate_limit"}}),
    );
    let proxy = proxy(ConfigBuilder::new(&mock).build(), secrets());

    let err = proxy.create_response(COMPANY, &ask("gpt-5", "hi")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Llm);
}

#[tokio::test]
async fn unknown_model_is_rejected_before_any_call() {
    let mock = MockVendor::start().await.unwrap();
    let proxy = proxy(ConfigBuilder::new(&mock).build(), secrets());

    let err = proxy.create_response(COMPANY, &ask("llama-3", "hi")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Model);
    assert!(mock.recorded().is_empty());
}

#[tokio::test]
async fn missing_secret_is_api_key_error() {
    let mock = MockVendor::start().await.unwrap();
    let proxy = proxy(ConfigBuilder::new(&mock).build(), HashMap::new());

    let err = proxy.create_response(COMPANY, &ask("gpt-5", "hi")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ApiKey);

    let err = proxy.create_response("globex", &ask("gpt-5", "hi")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ApiKey);
    assert!(mock.recorded().is_empty());
}

#[tokio::test]
async fn per_provider_key_wins_over_company_key() {
    let mock = MockVendor::start().await.unwrap();
    mock.reply(Route::Responses, mock_vendor::responses_text("resp_1", "ok"))
        .reply(Route::Messages, mock_vendor::anthropic_text("ok"));
    let config = ConfigBuilder::new(&mock)
        .provider_key(ProviderKind::OpenAi, "ACME_OPENAI_KEY")
        .build();
    let mut secrets = secrets();
    secrets.insert("ACME_OPENAI_KEY".to_owned(), "sk-openai-only".to_owned());
    let proxy = proxy(config, secrets);

    proxy.create_response(COMPANY, &ask("gpt-5", "hi")).await.unwrap();
    proxy.create_response(COMPANY, &ask("claude-sonnet-4", "hi")).await.unwrap();

    let recorded = mock.recorded();
    assert_eq!(
        recorded[0].headers["authorization"].to_str().unwrap(),
        "Bearer sk-openai-only"
    );
    assert_eq!(recorded[1].headers["x-api-key"].to_str().unwrap(), COMPANY_KEY);
}

#[tokio::test]
async fn provider_key_alone_is_enough() {
    let mock = MockVendor::start().await.unwrap();
    mock.reply(Route::ChatCompletions, mock_vendor::chat_text("ok"));
    let config = ConfigBuilder::new(&mock)
        .without_company_key()
        .provider_key(ProviderKind::DeepSeek, "ACME_DEEPSEEK_KEY")
        .build();
    let secrets = HashMap::from([("ACME_DEEPSEEK_KEY".to_owned(), "sk-deepseek".to_owned())]);
    let proxy = proxy(config, secrets);

    proxy.create_response(COMPANY, &ask("deepseek-chat", "hi")).await.unwrap();
    let err = proxy.create_response(COMPANY, &ask("gpt-5", "hi")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ApiKey);
}

#[tokio::test]
async fn adapters_are_cached_until_invalidated() {
    let mock = MockVendor::start().await.unwrap();
    for id in ["resp_1", "resp_2", "resp_3"] {
        mock.reply(Route::Responses, mock_vendor::responses_text(id, "ok"));
    }
    let proxy = proxy(ConfigBuilder::new(&mock).build(), secrets());

    proxy.create_response(COMPANY, &ask("gpt-5", "one")).await.unwrap();
    proxy.create_response("ACME", &ask("gpt-5", "two")).await.unwrap();
    assert_eq!(proxy.cached_adapters(), 1);

    proxy.invalidate(COMPANY);
    assert_eq!(proxy.cached_adapters(), 0);

    proxy.create_response(COMPANY, &ask("gpt-5", "three")).await.unwrap();
    assert_eq!(proxy.cached_adapters(), 1);

    proxy.invalidate_all();
    assert_eq!(proxy.cached_adapters(), 0);
}
