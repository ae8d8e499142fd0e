use picfind::config::OpenAiOptions;
use picfind::describe::Describer;
use picfind::embed::{EMBEDDING_MODEL, Embedder};
use picfind::openai::{ModelError, OpenAiClient};
use rstest::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(base_url: &str) -> OpenAiClient {
    OpenAiClient::new(&OpenAiOptions {
        api_key: "test-key".to_string(),
        base_url: base_url.to_string(),
        timeout: 10,
    })
    .unwrap()
}

#[fixture]
fn image() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("photo.png");
    std::fs::write(&path, b"not really a png").unwrap();
    (dir, path)
}

#[test]
fn test_empty_api_key_rejected() {
    let opts = OpenAiOptions { api_key: String::new(), base_url: "http://x".into(), timeout: 1 };
    assert!(OpenAiClient::new(&opts).is_err());
}

#[rstest]
#[tokio::test]
async fn test_describe_reasoning_model(image: (TempDir, std::path::PathBuf)) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({ "model": "gpt-5", "max_completion_tokens": 400 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "A cat on a sofa." }, "finish_reason": "stop" }],
            "usage": {
                "completion_tokens": 120,
                "completion_tokens_details": { "reasoning_tokens": 100 }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let desc = client(&server.uri()).describe(&image.1, "gpt-5").await.unwrap();
    assert_eq!(desc.text, "A cat on a sofa.");
    assert_eq!(desc.stats.output_tokens, 120);
    assert_eq!(desc.stats.reasoning_tokens, 100);
    assert!(desc.to_string().ends_with("[Stats | Output: 120 | Reasoning: 100 | Finish: stop]"));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("temperature").is_none());
    assert!(body.get("max_tokens").is_none());
    let url = body["messages"][0]["content"][1]["image_url"]["url"].as_str().unwrap();
    assert!(url.starts_with("data:image/png;base64,"));
}

#[rstest]
#[tokio::test]
async fn test_describe_classic_model(image: (TempDir, std::path::PathBuf)) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "model": "gpt-4o", "temperature": 0.7, "max_tokens": 400 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "" }, "finish_reason": "length" }],
            "usage": { "completion_tokens": 400 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let desc = client(&server.uri()).describe(&image.1, "gpt-4o").await.unwrap();
    assert!(desc.empty);
    assert!(desc.text.contains("400 tokens"));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("max_completion_tokens").is_none());
}

#[rstest]
#[tokio::test]
async fn test_describe_api_error(image: (TempDir, std::path::PathBuf)) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "message": "Unsupported parameter: 'temperature'" }
        })))
        .mount(&server)
        .await;

    match client(&server.uri()).describe(&image.1, "gpt-5.1").await {
        Err(ModelError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Unsupported parameter: 'temperature'");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[rstest]
#[tokio::test]
async fn test_describe_unreachable(image: (TempDir, std::path::PathBuf)) {
    let result = client("http://127.0.0.1:1").describe(&image.1, "gpt-4o-mini").await;
    assert!(matches!(result, Err(ModelError::Transport(_))));
}

#[tokio::test]
async fn test_describe_missing_image() {
    let result = client("http://127.0.0.1:1")
        .describe(std::path::Path::new("/definitely/not/here.jpg"), "gpt-4o")
        .await;
    assert!(matches!(result, Err(ModelError::Image(_))));
}

#[tokio::test]
async fn test_embed_strips_stats_and_is_stable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_partial_json(json!({ "model": EMBEDDING_MODEL, "input": "A red car." })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "embedding": [0.25, -0.5, 1.0] }]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server.uri());
    let text = "A red car.\n\n[Stats | Output: 5 | Reasoning: 0 | Finish: stop]";
    let first = client.embed(text).await.unwrap();
    let second = client.embed("A red car.").await.unwrap();
    assert_eq!(first, vec![0.25, -0.5, 1.0]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_embed_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let result = client(&server.uri()).embed("anything").await;
    assert!(matches!(result, Err(ModelError::EmptyResponse)));
}
