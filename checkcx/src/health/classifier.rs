//! ステータス分類器
//!
//! HTTPの結果・レイテンシ・エラーボディから稼働状態とメッセージを決める純関数。
//! リトライや副作用は持たない。

use crate::common::error::CxError;
use crate::types::HealthStatus;

/// degraded判定の閾値（ミリ秒）。この値ちょうどはoperational
pub const DEGRADED_THRESHOLD_MS: u64 = 6_000;

/// メッセージの最大長（文字数）
pub const MAX_MESSAGE_CHARS: usize = 280;

const UNKNOWN_ERROR: &str = "Unknown error";

/// 1回のプローブで観測した結果
#[derive(Debug)]
pub struct ProbeOutcome {
    /// 応答ヘッダ受信までのレイテンシ。応答がなければNone
    pub latency_ms: Option<u64>,
    /// 成功時は2xxステータスコード、失敗時は分類済みエラー
    pub response: Result<u16, CxError>,
}

impl ProbeOutcome {
    /// 2xx応答
    pub fn success(status: u16, latency_ms: u64) -> Self {
        Self {
            latency_ms: Some(latency_ms),
            response: Ok(status),
        }
    }

    /// 非2xx応答（抽出済みエラーメッセージ付き）
    pub fn http_error(status: u16, latency_ms: u64, message: String) -> Self {
        Self {
            latency_ms: Some(latency_ms),
            response: Err(CxError::Protocol { status, message }),
        }
    }

    /// 応答なしの失敗（タイムアウト、接続エラー、リクエスト構築失敗）
    pub fn no_response(error: CxError) -> Self {
        Self {
            latency_ms: None,
            response: Err(error),
        }
    }
}

/// 分類結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// 稼働状態
    pub status: HealthStatus,
    /// 表示用メッセージ（最大280文字）
    pub message: String,
}

/// 観測結果を稼働状態に分類する
pub fn classify(outcome: &ProbeOutcome, degraded_threshold_ms: u64) -> Verdict {
    let (status, message) = match &outcome.response {
        Ok(code) if (200..300).contains(code) => {
            let latency = outcome.latency_ms.unwrap_or(0);
            if latency <= degraded_threshold_ms {
                (HealthStatus::Operational, format!("OK (HTTP {})", code))
            } else {
                (
                    HealthStatus::Degraded,
                    format!("Slow response: {}ms", latency),
                )
            }
        }
        Ok(code) => (HealthStatus::Failed, format!("HTTP {}", code)),
        Err(CxError::Protocol { status, message }) => {
            let message = if message.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                message.clone()
            };
            (HealthStatus::Failed, message)
        }
        Err(CxError::Timeout) => (HealthStatus::Failed, CxError::Timeout.to_string()),
        Err(CxError::Transport(message)) if message.trim().is_empty() => {
            (HealthStatus::Failed, UNKNOWN_ERROR.to_string())
        }
        Err(other) => (HealthStatus::Failed, other.to_string()),
    };

    Verdict {
        status,
        message: truncate_message(&message),
    }
}

/// 文字境界を保ったままメッセージを切り詰める
pub fn truncate_message(message: &str) -> String {
    message.chars().take(MAX_MESSAGE_CHARS).collect()
}
