//! チェック結果型定義

use super::provider::ProviderType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// プロバイダID → 履歴（新しい順）
pub type HistoryMap = BTreeMap<String, Vec<CheckResult>>;

/// 稼働状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// 正常
    Operational,
    /// 成功したが閾値より遅い
    Degraded,
    /// 失敗（非2xx、ネットワークエラー、タイムアウト）
    Failed,
}

impl HealthStatus {
    /// 文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operational => "operational",
            Self::Degraded => "degraded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "operational" => Ok(Self::Operational),
            "degraded" => Ok(Self::Degraded),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown health status: {}", other)),
        }
    }
}

/// 1回のプローブ結果
///
/// 生成後は不変。履歴には一度だけ書き込まれる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// プロバイダID
    pub provider_id: String,
    /// 表示名
    pub name: String,
    /// プロバイダ種別
    pub provider_type: ProviderType,
    /// 表示用エンドポイント（未指定時は実際に使用したURL）
    pub endpoint: String,
    /// モデル
    pub model: String,
    /// 稼働状態
    pub status: HealthStatus,
    /// レイテンシ（ミリ秒）。応答を計測できなかった場合はNone
    pub latency_ms: Option<u64>,
    /// プローブ完了時刻
    pub checked_at: DateTime<Utc>,
    /// 結果の要約
    pub message: String,
}
