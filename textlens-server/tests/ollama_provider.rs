//! Ollama adapter against a throw-away local backend.

use std::time::Duration;

use axum::{
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use textlens_server::config::LlmConfig;
use textlens_server::llm::{LlmError, LlmProvider, OllamaProvider, Sentiment};

/// Serve `app` on an ephemeral port, returning its base URL
async fn spawn_backend(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn provider(base_url: String, timeout: Duration) -> OllamaProvider {
    OllamaProvider::new(&LlmConfig {
        base_url,
        model: "test-model".to_string(),
        api_key: None,
        timeout,
    })
    .unwrap()
}

fn generate_reply(response: &str) -> Json<Value> {
    Json(json!({
        "model": "test-model",
        "created_at": "2024-01-01T00:00:00Z",
        "response": response,
        "done": true,
        "eval_count": 12
    }))
}

/// Answers summary prompts with prose and metadata prompts (format=json) with JSON
async fn well_behaved(Json(request): Json<Value>) -> Json<Value> {
    if request["format"] == "json" {
        generate_reply(r#"{"title": "Grid storage", "topics": ["energy", "storage", "grids"], "sentiment": "positive"}"#)
    } else {
        assert_eq!(request["stream"], false);
        generate_reply("  Storage keeps the grid stable.  ")
    }
}

#[tokio::test]
async fn summary_and_metadata_round_trip() {
    let base = spawn_backend(
        Router::new()
            .route("/api/generate", post(well_behaved))
            .route("/api/tags", get(|| async { Json(json!({ "models": [] })) })),
    )
    .await;
    let provider = provider(base, Duration::from_secs(5));

    let summary = provider.generate_summary("Some long text").await.unwrap();
    assert_eq!(summary, "Storage keeps the grid stable.");

    let metadata = provider.extract_metadata("Some long text").await.unwrap();
    assert_eq!(metadata.title, "Grid storage");
    assert_eq!(metadata.topics, vec!["energy", "storage", "grids"]);
    assert_eq!(metadata.sentiment, Sentiment::Positive);

    provider.health_check().await.unwrap();
}

#[tokio::test]
async fn auth_failure_is_unavailable() {
    let base = spawn_backend(Router::new().route(
        "/api/generate",
        post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
    ))
    .await;

    let err = provider(base, Duration::from_secs(5))
        .generate_summary("text")
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Unavailable(msg) if msg.contains("authentication")));
}

#[tokio::test]
async fn server_error_is_unavailable() {
    let base = spawn_backend(Router::new().route(
        "/api/generate",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model not loaded") }),
    ))
    .await;

    let err = provider(base, Duration::from_secs(5))
        .extract_metadata("text")
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Unavailable(msg) if msg.contains("model not loaded")));
}

#[tokio::test]
async fn garbage_payloads_are_malformed() {
    let base = spawn_backend(
        Router::new()
            .route("/api/generate", post(|| async { "this is not json" }))
            .route(
                "/other/api/generate",
                post(|| async { generate_reply("I'd rather write a poem.") }),
            ),
    )
    .await;

    let err = provider(base.clone(), Duration::from_secs(5))
        .generate_summary("text")
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::MalformedResponse(_)));

    // Valid envelope, but the model ignored the JSON instruction
    let err = provider(format!("{base}/other"), Duration::from_secs(5))
        .extract_metadata("text")
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::MalformedResponse(_)));
}

#[tokio::test]
async fn empty_summary_is_malformed() {
    let base = spawn_backend(
        Router::new().route("/api/generate", post(|| async { generate_reply("   ") })),
    )
    .await;

    let err = provider(base, Duration::from_secs(5))
        .generate_summary("text")
        .await
        .unwrap_err();
    assert_eq!(err, LlmError::MalformedResponse("empty summary".to_string()));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let base = spawn_backend(Router::new().route(
        "/api/generate",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            generate_reply("too late")
        }),
    ))
    .await;

    let timeout = Duration::from_millis(100);
    let err = provider(base, timeout)
        .generate_summary("text")
        .await
        .unwrap_err();
    assert_eq!(err, LlmError::Timeout(timeout));
}

#[tokio::test]
async fn unreachable_backend_is_unavailable() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let provider = provider(format!("http://{addr}"), Duration::from_secs(5));
    let err = provider.generate_summary("text").await.unwrap_err();
    assert!(matches!(err, LlmError::Unavailable(_)));
    assert!(matches!(
        provider.health_check().await,
        Err(LlmError::Unavailable(_))
    ));
}

#[tokio::test]
async fn api_key_is_sent_as_bearer_token() {
    async fn tags(headers: HeaderMap) -> impl IntoResponse {
        match headers.get("authorization").and_then(|v| v.to_str().ok()) {
            Some("Bearer secret-key") => (StatusCode::OK, Json(json!({ "models": [] }))),
            _ => (StatusCode::UNAUTHORIZED, Json(json!({ "error": "missing key" }))),
        }
    }
    let base = spawn_backend(Router::new().route("/api/tags", get(tags))).await;

    let with_key = OllamaProvider::new(&LlmConfig {
        base_url: base.clone(),
        model: "test-model".to_string(),
        api_key: Some("secret-key".to_string()),
        timeout: Duration::from_secs(5),
    })
    .unwrap();
    with_key.health_check().await.unwrap();

    let without_key = provider(base, Duration::from_secs(5));
    assert!(matches!(
        without_key.health_check().await,
        Err(LlmError::Unavailable(_))
    ));
}
