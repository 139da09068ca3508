//! テスト共通ユーティリティ

use checkcx::config::PollingConfig;
use checkcx::dashboard::DashboardService;
use checkcx::db::{check_history::HistoryStore, init_pool};
use checkcx::health::ProbeRunner;
use checkcx::types::{ProviderConfig, ProviderType};
use serde_json::{json, Value};
use std::time::Duration;

/// テスト用プロバイダ設定
#[allow(dead_code)]
pub fn provider(id: &str, provider_type: ProviderType, endpoint: &str) -> ProviderConfig {
    ProviderConfig {
        id: id.to_string(),
        name: id.to_uppercase(),
        provider_type,
        endpoint: endpoint.to_string(),
        model: match provider_type {
            ProviderType::OpenAi => "gpt-4o-mini",
            ProviderType::Gemini => "gemini-1.5-flash",
            ProviderType::Anthropic => "claude-3-haiku",
        }
        .to_string(),
        credential: format!("{}-secret-key", id),
    }
}

/// 到達不能なエンドポイント
#[allow(dead_code)]
pub const UNREACHABLE_ENDPOINT: &str = "http://127.0.0.1:9";

/// テスト用プローブ実行器（短いタイムアウト）
#[allow(dead_code)]
pub fn test_runner() -> ProbeRunner {
    ProbeRunner::default().with_timeout(Duration::from_secs(3))
}

/// インメモリSQLiteの履歴ストア
#[allow(dead_code)]
pub async fn memory_store() -> HistoryStore {
    let pool = init_pool("sqlite::memory:")
        .await
        .expect("Failed to create test database");
    HistoryStore::sqlite(pool)
}

/// テスト用ダッシュボードサービス（60秒間隔）
#[allow(dead_code)]
pub async fn dashboard_service(configs: Vec<ProviderConfig>) -> DashboardService {
    DashboardService::new(
        configs,
        test_runner(),
        memory_store().await,
        PollingConfig::default(),
    )
}

/// OpenAI互換の成功レスポンス
#[allow(dead_code)]
pub fn openai_ok_body() -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": "pong"}}]
    })
}
