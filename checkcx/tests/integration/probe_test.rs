//! Integration Test: プロバイダプローブ
//!
//! アダプタごとのリクエスト形状、分類、タイムアウト、並列実行

use crate::support::{openai_ok_body, provider, test_runner, UNREACHABLE_ENDPOINT};
use checkcx::health::{run_provider_checks, ProbeRunner};
use checkcx::types::{HealthStatus, ProviderType};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_openai_probe_sends_bearer_chat_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer main-secret-key"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini", "max_tokens": 3})))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let config = provider("main", ProviderType::OpenAi, &server.uri());
    let result = test_runner().probe(&config).await;

    assert_eq!(result.status, HealthStatus::Operational);
    assert_eq!(result.message, "OK (HTTP 200)");
    assert_eq!(result.endpoint, server.uri());
    assert!(result.latency_ms.is_some());
    assert_eq!(result.provider_id, "main");
}

#[tokio::test]
async fn test_anthropic_probe_sends_version_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "claude-secret-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({"max_tokens": 10})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"type": "message"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = provider("claude", ProviderType::Anthropic, &server.uri());
    let result = test_runner().probe(&config).await;

    assert_eq!(result.status, HealthStatus::Operational);
}

#[tokio::test]
async fn test_gemini_probe_passes_key_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .and(query_param("key", "gem-secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = format!("{}/v1beta", server.uri());
    let config = provider("gem", ProviderType::Gemini, &endpoint);
    let result = test_runner().probe(&config).await;

    assert_eq!(result.status, HealthStatus::Operational);
    assert_eq!(result.endpoint, endpoint);
}

#[tokio::test]
async fn test_http_error_message_is_extracted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let config = provider("main", ProviderType::OpenAi, &server.uri());
    let result = test_runner().probe(&config).await;

    assert_eq!(result.status, HealthStatus::Failed);
    assert_eq!(result.message, "Incorrect API key provided");
    assert!(result.latency_ms.is_some());
}

#[tokio::test]
async fn test_unresponsive_endpoint_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(openai_ok_body())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let runner = ProbeRunner::default().with_timeout(Duration::from_millis(200));
    let config = provider("slow", ProviderType::OpenAi, &server.uri());
    let result = runner.probe(&config).await;

    assert_eq!(result.status, HealthStatus::Failed);
    assert_eq!(result.message, "Request timed out");
    assert_eq!(result.latency_ms, None);
}

#[tokio::test]
async fn test_slow_success_is_degraded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(openai_ok_body())
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&server)
        .await;

    let runner = test_runner().with_degraded_threshold(20);
    let config = provider("main", ProviderType::OpenAi, &server.uri());
    let result = runner.probe(&config).await;

    assert_eq!(result.status, HealthStatus::Degraded);
    assert!(result.message.starts_with("Slow response: "));
    assert!(result.latency_ms.unwrap() > 20);
}

#[tokio::test]
async fn test_fanout_returns_one_result_per_provider() {
    let healthy = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_ok_body()))
        .mount(&healthy)
        .await;
    let broken = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&broken)
        .await;

    let configs = vec![
        provider("charlie", ProviderType::OpenAi, &healthy.uri()),
        provider("alpha", ProviderType::Anthropic, &broken.uri()),
        provider("bravo", ProviderType::OpenAi, UNREACHABLE_ENDPOINT),
    ];
    let results = run_provider_checks(&test_runner(), &configs).await;

    assert_eq!(results.len(), 3);
    let ids: Vec<_> = results.iter().map(|r| r.provider_id.as_str()).collect();
    assert_eq!(ids, ["alpha", "bravo", "charlie"]);
    assert_eq!(results[0].status, HealthStatus::Failed);
    assert_eq!(results[0].message, "upstream exploded");
    assert_eq!(results[1].status, HealthStatus::Failed);
    assert_eq!(results[2].status, HealthStatus::Operational);
}

#[tokio::test]
async fn test_gemini_transport_failure_does_not_leak_key() {
    let mut config = provider(
        "gem",
        ProviderType::Gemini,
        &format!("{}/v1beta", UNREACHABLE_ENDPOINT),
    );
    config.credential = "AIzaSUPERSECRETKEY".to_string();

    let result = test_runner().probe(&config).await;

    assert_eq!(result.status, HealthStatus::Failed);
    assert!(!result.message.contains("SUPERSECRET"), "{}", result.message);
    assert!(!result.message.contains("key="), "{}", result.message);
    assert!(!result.endpoint.contains("SUPERSECRET"));
    assert!(result.message.to_lowercase().contains("refused"), "{}", result.message);
}
