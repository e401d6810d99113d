//! OpenAI adapter against a mock HTTP server

mod common;

use std::time::Duration;

use llm_wrappers::{
    create_tool_declaration, Agent, ApiFormat, ChatContext, FinishReason, LlmError, LlmProvider,
    OpenAiClient, OpenAiConfig, PromptTurn, ResponseTurn, RetryPolicy, ToolDeclaration, ToolRegistry,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenAiClient {
    let config = OpenAiConfig::new("sk-test", "gpt-4o-mini")
        .with_base_url(format!("{}/v1", server.uri()))
        .with_retry(RetryPolicy::fixed(3, Duration::from_millis(10)));
    OpenAiClient::new(config).unwrap()
}

fn completion(message: Value, finish_reason: &str) -> Value {
    json!({
        "id": "chatcmpl-123",
        "model": "gpt-4o-mini",
        "choices": [{"index": 0, "message": message, "finish_reason": finish_reason}],
        "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
    })
}

fn greeting_payload(client: &OpenAiClient) -> llm_wrappers::ProviderPayload {
    let context = ChatContext::new("You are terse.", client.payload_format());
    context.formatted_prompt(&PromptTurn::user("Hello"))
}

#[tokio::test]
async fn test_stop_reply_is_parsed() {
    common::init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": "You are terse."},
                {"role": "user", "content": "Hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({"role": "assistant", "content": "Hi."}),
            "stop",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reply = client.get_response(&greeting_payload(&client)).await.unwrap();

    assert_eq!(reply.finish_reason, FinishReason::Stop);
    assert!(matches!(reply.turn, ResponseTurn::Message(ref m) if m.text == "Hi."));
    let usage = reply.usage.unwrap();
    assert_eq!(usage.input_tokens, 12);
    assert_eq!(usage.output_tokens, 5);
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "0.01")
                .set_body_json(json!({"error": {"message": "Rate limit reached", "type": "requests", "code": "rate_limit_exceeded"}})),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({"role": "assistant", "content": "Hi again."}),
            "stop",
        )))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reply = client.get_response(&greeting_payload(&client)).await.unwrap();

    assert!(matches!(reply.turn, ResponseTurn::Message(ref m) if m.text == "Hi again."));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unrepresentable_retry_after_falls_back_to_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1e20"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({"role": "assistant", "content": "Back."}),
            "stop",
        )))
        .mount(&server)
        .await;

    let config = OpenAiConfig::new("sk-test", "gpt-4o-mini")
        .with_base_url(format!("{}/v1", server.uri()))
        .with_retry(RetryPolicy::fixed(1, Duration::from_millis(10)));
    let client = OpenAiClient::new(config).unwrap();
    let reply = client.get_response(&greeting_payload(&client)).await.unwrap();

    assert!(matches!(reply.turn, ResponseTurn::Message(ref m) if m.text == "Back."));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_payload_tools_replace_configured_tools() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({"role": "assistant", "content": "ok"}),
            "stop",
        )))
        .mount(&server)
        .await;

    let client = client_for(&server)
        .with_tools(vec![ToolDeclaration::new("configured_tool", "Set at construction")]);

    client.get_response(&greeting_payload(&client)).await.unwrap();
    let payload = greeting_payload(&client)
        .with_tools(vec![ToolDeclaration::new("chat_complete", "Finish the chat")]);
    client.get_response(&payload).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let first: Value = requests[0].body_json().unwrap();
    assert_eq!(first["tools"][0]["function"]["name"], "configured_tool");
    let second: Value = requests[1].body_json().unwrap();
    let tools = second["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["function"]["name"], "chat_complete");
}

#[tokio::test]
async fn test_persistent_outage_exhausts_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get_response(&greeting_payload(&client)).await.unwrap_err();

    match err {
        LlmError::RetryExhausted { attempts, last_error } => {
            assert_eq!(attempts, 4);
            assert!(matches!(*last_error, LlmError::ServiceUnavailable(_)));
        }
        other => panic!("Expected RetryExhausted, got {:?}", other),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_authentication_failure_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error", "code": "invalid_api_key"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get_response(&greeting_payload(&client)).await.unwrap_err();

    assert!(matches!(err, LlmError::AuthenticationError(ref m) if m == "Incorrect API key provided"));
}

#[tokio::test]
async fn test_unknown_finish_reason_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({"role": "assistant", "content": ""}),
            "content_filter",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get_response(&greeting_payload(&client)).await.unwrap_err();

    assert!(matches!(
        err,
        LlmError::UnrecognizedResponseKind { ref finish_reason } if finish_reason == "content_filter"
    ));
}

#[tokio::test]
async fn test_legacy_function_call_reply() {
    let server = MockServer::start().await;
    let config = OpenAiConfig::new("sk-test", "gpt-3.5-turbo-0613")
        .with_base_url(format!("{}/v1", server.uri()))
        .with_api_format(ApiFormat::Functions)
        .with_retry(RetryPolicy::none());
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({
                "role": "assistant",
                "content": null,
                "function_call": {"name": "get_order_status", "arguments": "{\"order_id\":\"10045\"}"}
            }),
            "function_call",
        )))
        .mount(&server)
        .await;

    let client = OpenAiClient::new(config).unwrap();
    let reply = client.get_response(&greeting_payload(&client)).await.unwrap();

    match reply.turn {
        ResponseTurn::ToolCall(call) => {
            assert_eq!(call.tool_name, "get_order_status");
            assert!(call.call_id.starts_with("call_"));
        }
        other => panic!("Expected tool call, got {:?}", other),
    }
}

#[derive(Deserialize, JsonSchema)]
struct OrderArgs {
    /// Order ID of the order
    order_id: String,
}

#[tokio::test]
async fn test_agent_round_trip_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_abc",
                    "type": "function",
                    "function": {"name": "get_order_status", "arguments": "{\"order_id\":\"10050\"}"}
                }]
            }),
            "tool_calls",
        )))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({"role": "assistant", "content": "Order 10050 is in transit."}),
            "stop",
        )))
        .mount(&server)
        .await;

    let mut registry = ToolRegistry::new();
    registry
        .register_sync(
            create_tool_declaration::<OrderArgs>("get_order_status", "Get status of an order"),
            |args: OrderArgs| Ok(format!("Order {} is In Transit", args.order_id)),
        )
        .unwrap();
    // No `with_tools`: the agent attaches the registry's declarations itself
    let client = client_for(&server);
    let agent = Agent::new(Box::new(client), Box::new(registry));
    let mut context = agent.new_chat("You are a support agent.");

    let outcome = agent.chat(&mut context, "Where is order 10050?").await.unwrap();

    assert_eq!(outcome.text(), Some("Order 10050 is in transit."));
    assert_eq!(context.usage().input_tokens, 24);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let first: Value = requests[0].body_json().unwrap();
    assert_eq!(first["tools"][0]["function"]["name"], "get_order_status");
    assert_eq!(first["parallel_tool_calls"], false);

    let second: Value = requests[1].body_json().unwrap();
    let messages = second["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2]["tool_calls"][0]["id"], "call_abc");
    assert_eq!(
        messages[3],
        json!({
            "role": "tool",
            "tool_call_id": "call_abc",
            "name": "get_order_status",
            "content": "Order 10050 is In Transit"
        })
    );
}
