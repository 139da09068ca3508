//! プローブ実行
//!
//! 1つのプロバイダ設定から必ず1つの`CheckResult`を作る。エラーは投げず、
//! すべて`failed`結果に変換する。

use super::adapters::{adapter_for, ProbeRequest};
use super::classifier::{classify, ProbeOutcome, DEGRADED_THRESHOLD_MS};
use crate::common::error::CxError;
use crate::types::{CheckResult, ProviderConfig};
use chrono::Utc;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// プローブのタイムアウト（秒）
pub const PROBE_TIMEOUT_SECS: u64 = 15;

/// プローブ実行器
///
/// `reqwest::Client`は接続プールを共有するためクローンして使い回す。
#[derive(Clone, Debug)]
pub struct ProbeRunner {
    /// HTTPクライアント
    client: Client,
    /// 1リクエストのハードタイムアウト
    timeout: Duration,
    /// degraded判定の閾値（ミリ秒）
    degraded_threshold_ms: u64,
}

impl Default for ProbeRunner {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl ProbeRunner {
    /// 新しいプローブ実行器を作成
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(PROBE_TIMEOUT_SECS),
            degraded_threshold_ms: DEGRADED_THRESHOLD_MS,
        }
    }

    /// タイムアウトを設定
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// degraded閾値を設定
    pub fn with_degraded_threshold(mut self, threshold_ms: u64) -> Self {
        self.degraded_threshold_ms = threshold_ms;
        self
    }

    /// 現在のタイムアウト
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 単一プロバイダをプローブする
    pub async fn probe(&self, config: &ProviderConfig) -> CheckResult {
        let adapter = adapter_for(config.provider_type);

        let request = match adapter.build_request(config) {
            Ok(request) => request,
            Err(e) => {
                warn!(
                    provider_id = %config.id,
                    error = %e,
                    "Failed to build probe request"
                );
                return self.finish(config, &config.endpoint, ProbeOutcome::no_response(e));
            }
        };

        let outcome = self.execute(&request, |body| adapter.extract_error_message(body)).await;
        self.finish(config, request.reported_endpoint(), outcome)
    }

    /// リクエストを送信し、タイムアウト付きで結果を観測する
    ///
    /// タイムアウト時はこのリクエストのfutureだけがdropされ、接続はキャンセルされる。
    async fn execute<F>(&self, request: &ProbeRequest, extract: F) -> ProbeOutcome
    where
        F: Fn(&str) -> String,
    {
        let started = Instant::now();
        let exchange = async {
            let response = self
                .client
                .post(&request.url)
                .headers(request.headers.clone())
                .json(&request.body)
                .send()
                .await?;
            let latency_ms = started.elapsed().as_millis() as u64;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, CxError>((status, latency_ms, body))
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok((status, latency_ms, _))) if status.is_success() => {
                ProbeOutcome::success(status.as_u16(), latency_ms)
            }
            Ok(Ok((status, latency_ms, body))) => {
                ProbeOutcome::http_error(status.as_u16(), latency_ms, extract(&body))
            }
            Ok(Err(e)) => ProbeOutcome::no_response(e),
            Err(_elapsed) => ProbeOutcome::no_response(CxError::Timeout),
        }
    }

    fn finish(&self, config: &ProviderConfig, endpoint: &str, outcome: ProbeOutcome) -> CheckResult {
        let verdict = classify(&outcome, self.degraded_threshold_ms);

        debug!(
            provider_id = %config.id,
            provider_type = %config.provider_type,
            status = %verdict.status,
            latency_ms = ?outcome.latency_ms,
            "Probe completed"
        );

        CheckResult {
            provider_id: config.id.clone(),
            name: config.name.clone(),
            provider_type: config.provider_type,
            endpoint: endpoint.to_string(),
            model: config.model.clone(),
            status: verdict.status,
            latency_ms: outcome.latency_ms,
            checked_at: Utc::now(),
            message: verdict.message,
        }
    }
}
