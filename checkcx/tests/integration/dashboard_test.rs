//! Integration Test: ダッシュボード読み出し
//!
//! ポーリング間隔内の重複プローブ抑止、リフレッシュモード、履歴の蓄積

use crate::support::{dashboard_service, openai_ok_body, provider, UNREACHABLE_ENDPOINT};
use checkcx::dashboard::RefreshMode;
use checkcx::types::{HealthStatus, ProviderType};
use std::sync::Arc;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn healthy_server(expected_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_ok_body()))
        .expect(expected_calls)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_reads_within_interval_probe_once() {
    let server = healthy_server(1).await;
    let service =
        dashboard_service(vec![provider("main", ProviderType::OpenAi, &server.uri())]).await;

    let first = service.load_dashboard_data(RefreshMode::Always).await;
    let second = service.load_dashboard_data(RefreshMode::Always).await;

    assert_eq!(first.total, 1);
    assert_eq!(second.provider_timelines[0].items.len(), 1);
    assert_eq!(first.provider_timelines, second.provider_timelines);
}

#[tokio::test]
async fn test_concurrent_reads_share_one_probe() {
    let server = healthy_server(1).await;
    let service = Arc::new(
        dashboard_service(vec![provider("main", ProviderType::OpenAi, &server.uri())]).await,
    );

    let reads = (0..6).map(|_| {
        let service = Arc::clone(&service);
        async move { service.load_dashboard_data(RefreshMode::Always).await }
    });
    let results = futures::future::join_all(reads).await;

    assert!(results.iter().all(|data| data.total == 1));
    assert!(results
        .iter()
        .all(|data| data.provider_timelines[0].items.len() == 1));
}

#[tokio::test]
async fn test_missing_mode_probes_only_on_cold_start() {
    let server = healthy_server(1).await;
    let service =
        dashboard_service(vec![provider("main", ProviderType::OpenAi, &server.uri())]).await;

    let cold = service.load_dashboard_data(RefreshMode::Missing).await;
    let warm = service.load_dashboard_data(RefreshMode::Missing).await;

    assert_eq!(cold.total, 1);
    assert_eq!(warm.total, 1);
    assert!(cold.last_updated.is_some());
}

#[tokio::test]
async fn test_never_mode_does_not_probe() {
    let server = healthy_server(0).await;
    let service =
        dashboard_service(vec![provider("main", ProviderType::OpenAi, &server.uri())]).await;

    let data = service.load_dashboard_data(RefreshMode::Never).await;

    assert_eq!(data.total, 0);
    assert!(data.provider_timelines.is_empty());
    assert!(data.last_updated.is_none());
}

#[tokio::test]
async fn test_failed_provider_still_gets_a_timeline() {
    let server = healthy_server(1).await;
    let service = dashboard_service(vec![
        provider("main", ProviderType::OpenAi, &server.uri()),
        provider("backup", ProviderType::Anthropic, UNREACHABLE_ENDPOINT),
    ])
    .await;

    let data = service.load_dashboard_data(RefreshMode::Always).await;

    assert_eq!(data.total, 2);
    let backup = data
        .provider_timelines
        .iter()
        .find(|t| t.id == "backup")
        .expect("backup timeline");
    assert_eq!(backup.latest.result.status, HealthStatus::Failed);
    assert_eq!(backup.latest.result.latency_ms, None);
    assert_eq!(data.provider_timelines[0].id, "backup");
}

#[tokio::test]
async fn test_probe_result_is_newest_history_entry() {
    let server = healthy_server(1).await;
    let service =
        dashboard_service(vec![provider("main", ProviderType::OpenAi, &server.uri())]).await;

    let before = chrono::Utc::now();
    let data = service.load_dashboard_data(RefreshMode::Always).await;
    let timeline = &data.provider_timelines[0];

    assert!(timeline.latest.result.checked_at >= before);
    assert_eq!(data.last_updated_at, Some(timeline.latest.result.checked_at));
    assert_eq!(timeline.latest.formatted_time.len(), "2024/01/01 00:00:00".len());
}
