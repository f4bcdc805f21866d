//! Anthropic client against a mock Messages API

use mockito::Matcher;
use regwatch_api::llm::{AnthropicClient, AnthropicConfig, LlmClient, LlmError, StructuredRequest};
use serde_json::json;

fn client(base_url: String) -> AnthropicClient {
    let mut config = AnthropicConfig::new("test-key");
    config.base_url = base_url;
    config.model = "claude-test".to_string();
    AnthropicClient::new(config).unwrap()
}

fn tagging_request() -> StructuredRequest {
    StructuredRequest {
        system: "Tag the feature.".to_string(),
        messages: vec!["Feature: Kids mode A mode for children".to_string()],
        output_name: "record_regulation_tags".to_string(),
        output_description: "Record the regulation tags that apply".to_string(),
        schema: json!({
            "type": "object",
            "properties": {"tags": {"type": "array", "items": {"type": "string"}}},
            "required": ["tags"]
        }),
    }
}

#[tokio::test]
async fn forced_tool_call_returns_tool_input() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "test-key")
        .match_header("anthropic-version", "2023-06-01")
        .match_body(Matcher::PartialJson(json!({
            "model": "claude-test",
            "system": "Tag the feature.",
            "tool_choice": {"type": "tool", "name": "record_regulation_tags"}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [
                    {"type": "text", "text": "Calling the tool."},
                    {"type": "tool_use", "id": "tu_1", "name": "record_regulation_tags",
                     "input": {"tags": ["coppa"]}}
                ],
                "stop_reason": "tool_use",
                "usage": {"input_tokens": 12, "output_tokens": 5}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let output = client(server.url())
        .structured(tagging_request())
        .await
        .unwrap();

    assert_eq!(output, json!({"tags": ["coppa"]}));
    mock.assert_async().await;
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_tolerated() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body(
            json!({
                "content": [{"type": "tool_use", "id": "tu_1", "name": "record_regulation_tags",
                             "input": {"tags": []}}],
                "stop_reason": "tool_use"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let result = client(format!("{}/", server.url()))
        .structured(tagging_request())
        .await;

    assert!(result.is_ok());
    mock.assert_async().await;
}

#[tokio::test]
async fn answer_without_the_tool_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body(
            json!({
                "content": [{"type": "text", "text": "I cannot help with that."}],
                "stop_reason": "end_turn"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let err = client(server.url())
        .structured(tagging_request())
        .await
        .unwrap_err();

    assert!(
        matches!(err, LlmError::MissingStructuredOutput(ref name) if name == "record_regulation_tags")
    );
}

#[tokio::test]
async fn http_errors_map_to_kinds() {
    let mut server = mockito::Server::new_async().await;

    for status in [401, 429, 529] {
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(status)
            .with_body(r#"{"type":"error","error":{"type":"x","message":"nope"}}"#)
            .create_async()
            .await;

        let err = client(server.url())
            .structured(tagging_request())
            .await
            .unwrap_err();

        match status {
            401 => assert!(matches!(err, LlmError::Authentication)),
            429 => assert!(matches!(err, LlmError::RateLimited)),
            _ => assert!(matches!(err, LlmError::Api(529, ref body) if body.contains("nope"))),
        }
        mock.remove_async().await;
    }
}

#[test]
fn empty_api_key_is_rejected() {
    let result = AnthropicClient::new(AnthropicConfig::new(""));
    assert!(matches!(result, Err(LlmError::Config(_))));
}
