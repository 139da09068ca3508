//! Integration Test: REST API

use crate::support::{dashboard_service, openai_ok_body, provider};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use checkcx::types::{ProviderConfig, ProviderType};
use checkcx::{api, AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn build_app() -> axum::Router {
    build_app_with(Vec::new()).await
}

async fn build_app_with(configs: Vec<ProviderConfig>) -> axum::Router {
    let service = dashboard_service(configs).await;
    api::create_router(AppState {
        dashboard: Arc::new(service),
    })
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, body) = get_json(build_app().await, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_dashboard_endpoint_with_empty_configuration() {
    let (status, body) = get_json(build_app().await, "/api/dashboard?refresh=always").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert_eq!(body["provider_timelines"], serde_json::json!([]));
    assert_eq!(body["poll_interval_ms"], 60_000);
    assert_eq!(body["poll_interval_label"], "1 minute");
    assert!(body["last_updated"].is_null());
}

#[tokio::test]
async fn test_dashboard_endpoint_defaults_refresh_mode() {
    let (status, body) = get_json(build_app().await, "/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_dashboard_endpoint_rejects_unknown_refresh_mode() {
    let (status, body) = get_json(build_app().await, "/api/dashboard?refresh=sometimes").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("unknown refresh mode"));
}

#[tokio::test]
async fn test_dashboard_endpoint_returns_probed_timeline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_ok_body()))
        .expect(1)
        .mount(&server)
        .await;
    let app = build_app_with(vec![provider("main", ProviderType::OpenAi, &server.uri())]).await;

    let (status, body) = get_json(app.clone(), "/api/dashboard?refresh=always").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    let timeline = &body["provider_timelines"][0];
    assert_eq!(timeline["id"], "main");
    assert_eq!(timeline["items"].as_array().unwrap().len(), 1);
    let latest = &timeline["latest"];
    assert_eq!(latest["provider_id"], "main");
    assert_eq!(latest["name"], "MAIN");
    assert_eq!(latest["status"], "operational");
    assert_eq!(latest["message"], "OK (HTTP 200)");
    assert_eq!(latest["endpoint"], server.uri());
    assert!(latest["latency_ms"].is_u64());
    assert_eq!(
        latest["formatted_time"].as_str().unwrap().len(),
        "2024/01/01 00:00:00".len()
    );
    assert_eq!(body["last_updated_at"], latest["checked_at"]);
    assert_eq!(body["last_updated"], latest["formatted_time"]);
    assert!(latest.get("credential").is_none());

    // 同一間隔内の再読み込みはキャッシュから返る
    let (_, again) = get_json(app, "/api/dashboard?refresh=always").await;
    assert_eq!(again["provider_timelines"], body["provider_timelines"]);
}
