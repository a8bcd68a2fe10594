//! HTTP-level tests for the CSS service against a mock OpenRouter.

use super::*;
use crate::openrouter::OpenRouterConfig;
use pagemagic_config::SettingsStore;
use serde_json::json;
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

async fn service_for(server: &MockServer, storage: &Storage) -> CssService {
    let config = OpenRouterConfig::default().with_base_url(server.uri());
    CssService::new(OpenRouterClient::new(config).unwrap(), storage)
}

async fn storage_with(api_key: Option<&str>, model: Option<&str>) -> Storage {
    let storage = Storage::in_memory();
    let settings = SettingsStore::new(storage.sync.clone());
    if let Some(key) = api_key {
        settings.set_api_key(key).await.unwrap();
    }
    if let Some(model) = model {
        settings.set_model(model).await.unwrap();
    }
    storage
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "gen-1",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 300, "completion_tokens": 40, "total_tokens": 340 }
    })
}

#[tokio::test]
async fn generate_css_sends_request_and_extracts_css() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/chat/completions"))
        .and(matchers::header("authorization", "Bearer sk-or-test"))
        .and(matchers::header("x-title", "PageMagic"))
        .and(matchers::body_partial_json(json!({
            "model": "meta/llama:free",
            "max_tokens": 2048
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
            "```css\nhtml body p { color: red !important; }\n```",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let storage = storage_with(Some("sk-or-test"), Some("meta/llama:free")).await;
    let service = service_for(&server, &storage).await;

    let result = service.generate_css("<p>hi</p>", "make text red").await.unwrap();
    assert_eq!(result.css, "html body p { color: red !important; }");
    assert_eq!(result.model, "meta/llama:free");
    assert_eq!(result.usage.total_tokens, 340);
    assert_eq!(result.cost, 0.0);
}

#[tokio::test]
async fn missing_api_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(matchers::any())
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("a{}")))
        .expect(0)
        .mount(&server)
        .await;

    let storage = storage_with(None, Some("m")).await;
    let service = service_for(&server, &storage).await;

    assert!(!service.initialize().await);
    let err = service.generate_css("<p/>", "x").await.unwrap_err();
    assert!(matches!(err, AiError::Config(ConfigError::MissingApiKey)));
    assert_eq!(
        err.to_string(),
        "OpenRouter API key not configured. Please check settings."
    );
}

#[tokio::test]
async fn missing_model_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let storage = storage_with(Some("sk-or-test"), None).await;
    let service = service_for(&server, &storage).await;

    let err = service.generate_css("<p/>", "x").await.unwrap_err();
    assert!(matches!(err, AiError::Config(ConfigError::MissingModel)));
}

#[tokio::test]
async fn key_saved_after_startup_is_picked_up() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("a { b: c; }")))
        .expect(1)
        .mount(&server)
        .await;

    let storage = storage_with(None, Some("m")).await;
    let service = service_for(&server, &storage).await;
    assert!(!service.initialize().await);

    SettingsStore::new(storage.sync.clone())
        .set_api_key("sk-or-late")
        .await
        .unwrap();
    assert_eq!(service.generate_css("<p/>", "x").await.unwrap().css, "a { b: c; }");
}

#[tokio::test]
async fn unauthorized_maps_to_auth_error() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_string(r#"{"error": {"message": "No auth credentials found"}}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let storage = storage_with(Some("sk-or-bad"), Some("m")).await;
    let service = service_for(&server, &storage).await;

    let err = service.generate_css("<p/>", "x").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Authentication failed (401). Check your OpenRouter API key. Details: No auth credentials found"
    );
}

#[tokio::test]
async fn rate_limit_names_the_model() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let storage = storage_with(Some("sk-or-k"), Some("google/gemma:free")).await;
    let service = service_for(&server, &storage).await;

    let err = service.generate_css("<p/>", "x").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Rate limit exceeded (429) for model google/gemma:free. Details: Too Many Requests"
    );
}

#[tokio::test]
async fn other_status_reports_detail() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"error": {"message": "context length exceeded"}}"#),
        )
        .mount(&server)
        .await;

    let storage = storage_with(Some("sk-or-k"), Some("m")).await;
    let service = service_for(&server, &storage).await;

    let err = service.generate_css("<p/>", "x").await.unwrap_err();
    assert!(matches!(err, AiError::Api { status: 400, .. }));
    assert_eq!(
        err.to_string(),
        "API request failed with status 400: context length exceeded"
    );
}

#[tokio::test]
async fn malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let storage = storage_with(Some("sk-or-k"), Some("m")).await;
    let service = service_for(&server, &storage).await;

    let err = service.generate_css("<p/>", "x").await.unwrap_err();
    assert!(matches!(err, AiError::InvalidResponse));
}

#[tokio::test]
async fn two_generations_sum_usage_per_model() {
    let server = MockServer::start().await;
    let mut body = completion_body("a { b: c; }");
    body["usage"]["cost"] = json!(0.5);
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(2)
        .mount(&server)
        .await;

    let storage = storage_with(Some("sk-or-k"), Some("m/one")).await;
    let service = service_for(&server, &storage).await;

    service.generate_css("<p/>", "x").await.unwrap();
    service.generate_css("<p/>", "y").await.unwrap();

    let total = service.usage().total().await.unwrap();
    assert_eq!(total.total_requests, 2);
    assert_eq!(total.total_cost, 1.0);
    assert_eq!(total.models["m/one"].requests, 2);
    assert_eq!(total.models["m/one"].tokens.prompt, 600);
    assert_eq!(total.models["m/one"].tokens.completion, 80);

    let today = service.usage().today().await.unwrap();
    assert_eq!(today.requests, 2);
    assert_eq!(today.total_cost, 1.0);
}

#[tokio::test]
async fn models_are_filtered_and_sorted() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("GET"))
        .and(matchers::path("/models"))
        .and(matchers::header("authorization", "Bearer sk-or-k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "x/paid", "name": "X: Paid" },
                { "id": "z/free", "name": "Zed (free)" },
                { "id": "b/free", "name": "Bee (free)" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let storage = storage_with(Some("sk-or-k"), None).await;
    let service = service_for(&server, &storage).await;

    let models = service.get_available_models().await.unwrap();
    let ids: Vec<&str> = models.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["b/free", "z/free"]);
}

#[tokio::test]
async fn models_without_key_is_empty() {
    let server = MockServer::start().await;
    Mock::given(matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let storage = storage_with(None, None).await;
    let service = service_for(&server, &storage).await;
    assert!(service.get_available_models().await.unwrap().is_empty());
}

#[tokio::test]
async fn models_error_reports_status() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let storage = storage_with(Some("sk-or-k"), None).await;
    let service = service_for(&server, &storage).await;

    let err = service.get_available_models().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to fetch models (500): Internal Server Error"
    );
}
