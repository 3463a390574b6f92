use super::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OllamaClient {
    let url = Url::parse(&server.uri()).expect("mock server uri should parse");
    let config = OllamaConfig {
        protocol: url.scheme().to_string(),
        host: url.host_str().expect("mock server has a host").to_string(),
        port: url.port().expect("mock server has a port"),
        model: "all-minilm".to_string(),
        batch_size: 2,
    };
    OllamaClient::new(&config)
        .expect("Failed to create client")
        .with_retry_delay(Duration::from_millis(10))
}

#[test]
fn client_configuration() {
    let config = OllamaConfig {
        protocol: "http".to_string(),
        host: "test-host".to_string(),
        port: 1234,
        model: "test-model".to_string(),
        batch_size: 128,
    };
    let client = OllamaClient::new(&config).expect("Failed to create client");

    assert_eq!(client.model, "test-model");
    assert_eq!(client.batch_size, 128);
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
    assert_eq!(client.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn client_builder_methods() {
    let client = OllamaClient::new(&OllamaConfig::default())
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(5)
        .with_retry_delay(Duration::from_millis(1));

    assert_eq!(client.retry_attempts, 5);
    assert_eq!(client.retry_delay, Duration::from_millis(1));
    assert_eq!(client.name(), "all-minilm");
}

#[tokio::test]
async fn embeds_in_batches() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({"input": ["one", "two"]})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"embeddings": [[1.0, 0.0], [0.0, 1.0]]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({"input": ["three"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embeddings": [[0.5, 0.5]]})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let texts = vec!["one".to_string(), "two".to_string(), "three".to_string()];
    let vectors = client.embed_batch(&texts).expect("embedding should succeed");

    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5]]);
}

#[tokio::test]
async fn count_mismatch_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embeddings": [[1.0]]})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.embed_batch(&["a".to_string(), "b".to_string()]);

    assert!(matches!(result, Err(RagError::Embedding(_))));
}

#[tokio::test]
async fn retries_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embeddings": [[0.25]]})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let vector = client.embed("retry me").expect("second attempt should succeed");

    assert_eq!(vector, vec![0.25]);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.embed("missing model");

    let message = result.expect_err("404 should fail").to_string();
    assert!(message.contains("404"), "unexpected error: {message}");
}

#[tokio::test]
async fn model_validation_accepts_latest_tag() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {"name": "nomic-embed-text:latest", "size": 274302450},
                {"name": "all-minilm:latest", "size": 45960996}
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.health_check().is_ok());

    let models = client.list_models().expect("models should list");
    assert_eq!(models.len(), 2);
}

#[tokio::test]
async fn model_validation_reports_missing_model() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"models": [{"name": "llama3:latest"}]})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let error = client
        .validate_model()
        .expect_err("model should be missing");
    assert!(error.to_string().contains("all-minilm"));
}

#[test]
fn empty_input_skips_the_server() {
    let client = OllamaClient::new(&OllamaConfig::default()).expect("Failed to create client");
    let vectors = client.embed_batch(&[]).expect("empty batch should succeed");
    assert!(vectors.is_empty());
}
