use super::*;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenAiCompatibleClient {
    OpenAiCompatibleClient::new(
        &format!("{}/v1/", server.uri()),
        "gpt-4o-mini",
        ApiKey::new("sk-test"),
        Duration::from_secs(5),
    )
}

fn reply(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ]
    })
}

#[test]
fn api_key_debug_is_redacted() {
    let key = ApiKey::new("sk-secret-value");
    let debug = format!("{:?}", key);

    assert!(!debug.contains("sk-secret-value"));
    assert_eq!(key.expose(), "sk-secret-value");
}

#[test]
fn blank_api_key_is_rejected() {
    let result = ApiKey::from_value("OPENAI_API_KEY", "   ");
    assert!(matches!(result, Err(RagError::Authentication(_))));

    let key = ApiKey::from_value("OPENAI_API_KEY", " sk-abc \n").expect("key should parse");
    assert_eq!(key.expose(), "sk-abc");
}

#[test]
fn missing_api_key_variable_is_an_authentication_error() {
    let result = ApiKey::from_env("METADATA_RAG_TEST_KEY_THAT_IS_NEVER_SET");
    assert!(matches!(result, Err(RagError::Authentication(_))));
}

#[test]
fn endpoint_trims_trailing_slash() {
    let client = OpenAiCompatibleClient::new(
        "https://openrouter.ai/api/v1/",
        "gpt-4o-mini",
        ApiKey::new("k"),
        Duration::from_secs(1),
    );
    assert_eq!(client.endpoint(), "https://openrouter.ai/api/v1/chat/completions");
    assert_eq!(client.model(), "gpt-4o-mini");
}

#[tokio::test]
async fn sends_model_messages_and_bearer_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("Orders holds orders.")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let answer = client
        .complete(&[ChatMessage::system("be brief"), ChatMessage::user("hi")])
        .expect("completion should succeed");

    assert_eq!(answer, "Orders holds orders.");

    let requests = server.received_requests().await.expect("requests recorded");
    let body: Value = requests[0].body_json().expect("json body");
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "be brief");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "hi");
}

#[tokio::test]
async fn unauthorized_maps_to_authentication() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let result = client_for(&server).complete(&[ChatMessage::user("hi")]);

    match result {
        Err(RagError::Authentication(message)) => {
            assert!(message.contains("Incorrect API key provided"), "{message}");
        }
        other => panic!("expected authentication error, got {other:?}"),
    }
}

#[tokio::test]
async fn too_many_requests_maps_to_rate_limit_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server).complete(&[ChatMessage::user("hi")]);
    assert!(matches!(result, Err(RagError::RateLimit(_))));
}

#[tokio::test]
async fn server_error_maps_to_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server).complete(&[ChatMessage::user("hi")]);

    match result {
        Err(RagError::Completion(message)) => assert!(message.contains("500"), "{message}"),
        other => panic!("expected completion error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_choices_is_a_completion_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let result = client_for(&server).complete(&[ChatMessage::user("hi")]);
    assert!(matches!(result, Err(RagError::Completion(_))));
}

#[tokio::test]
async fn malformed_body_is_a_completion_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client_for(&server).complete(&[ChatMessage::user("hi")]);
    assert!(matches!(result, Err(RagError::Completion(_))));
}

#[test]
fn unreachable_host_maps_to_network() {
    let client = OpenAiCompatibleClient::new(
        "http://127.0.0.1:9",
        "gpt-4o-mini",
        ApiKey::new("k"),
        Duration::from_secs(2),
    );

    let result = client.complete(&[ChatMessage::user("hi")]);
    assert!(matches!(result, Err(RagError::Network(_))));
}

#[test]
fn parses_first_choice() {
    let text = reply("first").to_string();
    assert_eq!(parse_completion(&text).expect("parse"), "first");
}
