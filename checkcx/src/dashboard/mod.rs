//! ダッシュボード読み出し
//!
//! 設定済みプロバイダの履歴を読み、必要に応じてポーリングキャッシュ経由でプローブし、
//! 表示用のタイムラインに整形する。

pub mod coalescer;

pub use coalescer::{cache_key, PollCoalescer};

use crate::config::PollingConfig;
use crate::db::check_history::HistoryStore;
use crate::health::fanout::compare_names;
use crate::health::{run_provider_checks, ProbeRunner};
use crate::types::{CheckResult, HistoryMap, ProviderConfig};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// 表示用時刻フォーマット（ローカル時刻）
pub const TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// 読み出し時のプローブ方針
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    /// 常にポーリングキャッシュを通す（間隔内ならキャッシュを返す）
    Always,
    /// 履歴が1件もない場合のみプローブする
    #[default]
    Missing,
    /// 読み出しのみ
    Never,
}

impl RefreshMode {
    /// 文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Missing => "missing",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for RefreshMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefreshMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "missing" => Ok(Self::Missing),
            "never" => Ok(Self::Never),
            other => Err(format!("unknown refresh mode: {}", other)),
        }
    }
}

/// タイムラインの1点
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineItem {
    /// チェック結果
    #[serde(flatten)]
    pub result: CheckResult,
    /// 表示用時刻
    pub formatted_time: String,
}

impl From<CheckResult> for TimelineItem {
    fn from(result: CheckResult) -> Self {
        let formatted_time = format_time(&result.checked_at);
        Self {
            result,
            formatted_time,
        }
    }
}

/// プロバイダ1つ分のタイムライン
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderTimeline {
    /// プロバイダID
    pub id: String,
    /// 新しい順の履歴
    pub items: Vec<TimelineItem>,
    /// 最新の結果（`items[0]`）
    pub latest: TimelineItem,
}

/// ダッシュボードのスナップショット
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardData {
    /// 表示名順のタイムライン
    pub provider_timelines: Vec<ProviderTimeline>,
    /// 全タイムライン中で最も新しいチェック時刻（表示用）
    pub last_updated: Option<String>,
    /// 全タイムライン中で最も新しいチェック時刻
    pub last_updated_at: Option<DateTime<Utc>>,
    /// タイムライン数
    pub total: usize,
    /// ポーリング間隔の表示ラベル
    pub poll_interval_label: String,
    /// ポーリング間隔（ミリ秒）
    pub poll_interval_ms: u64,
}

/// 表示用に時刻を整形
pub fn format_time(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format(TIME_FORMAT).to_string()
}

/// ダッシュボードサービス
///
/// プロバイダ設定・プローブ実行器・履歴ストア・ポーリングキャッシュを保持する。
pub struct DashboardService {
    configs: Arc<[ProviderConfig]>,
    allowed_ids: Arc<BTreeSet<String>>,
    cache_key: String,
    runner: ProbeRunner,
    history: HistoryStore,
    coalescer: PollCoalescer,
    polling: PollingConfig,
}

impl DashboardService {
    /// 新しいサービスを作成
    pub fn new(
        configs: Vec<ProviderConfig>,
        runner: ProbeRunner,
        history: HistoryStore,
        polling: PollingConfig,
    ) -> Self {
        let allowed_ids: BTreeSet<String> = configs.iter().map(|c| c.id.clone()).collect();
        let cache_key = cache_key(allowed_ids.iter().map(String::as_str), polling.interval_ms());
        Self {
            configs: configs.into(),
            allowed_ids: Arc::new(allowed_ids),
            cache_key,
            runner,
            history,
            coalescer: PollCoalescer::new(),
            polling,
        }
    }

    /// 設定済みプロバイダ
    pub fn configs(&self) -> &[ProviderConfig] {
        &self.configs
    }

    /// ポーリング設定
    pub fn polling(&self) -> PollingConfig {
        self.polling
    }

    /// 設定済みプロバイダの履歴を読む（プローブしない）
    pub async fn read_history(&self) -> HistoryMap {
        filter_history(self.history.load().await, &self.allowed_ids)
    }

    /// ポーリングキャッシュ経由で履歴を更新する
    ///
    /// プローブ結果が空の場合は履歴を上書きせず、既存の履歴を返す。
    pub async fn refresh_history(&self) -> HistoryMap {
        if self.allowed_ids.is_empty() {
            return HistoryMap::new();
        }

        let runner = self.runner.clone();
        let configs = Arc::clone(&self.configs);
        let store = self.history.clone();
        let allowed = Arc::clone(&self.allowed_ids);

        self.coalescer
            .refresh(&self.cache_key, self.polling.interval, move || async move {
                let results = run_provider_checks(&runner, &configs).await;
                let history = if results.is_empty() {
                    store.load().await
                } else {
                    store.append(&results).await
                };
                filter_history(history, &allowed)
            })
            .await
    }

    /// ダッシュボード用データを読み出す
    pub async fn load_dashboard_data(&self, mode: RefreshMode) -> DashboardData {
        let mut history = self.read_history().await;

        let needs_probe = match mode {
            RefreshMode::Always => true,
            RefreshMode::Missing => !self.allowed_ids.is_empty() && history.is_empty(),
            RefreshMode::Never => false,
        };
        if needs_probe {
            debug!(mode = %mode, "Refreshing history before dashboard read");
            history = self.refresh_history().await;
        }

        build_dashboard_data(history, &self.polling)
    }
}

/// 設定済みプロバイダ以外の履歴を除外する
fn filter_history(mut history: HistoryMap, allowed: &BTreeSet<String>) -> HistoryMap {
    history.retain(|id, _| allowed.contains(id));
    history
}

/// 履歴からダッシュボードデータを組み立てる
pub fn build_dashboard_data(history: HistoryMap, polling: &PollingConfig) -> DashboardData {
    let mut timelines: Vec<ProviderTimeline> = history
        .into_iter()
        .filter_map(|(id, mut series)| {
            series.sort_by(|a, b| b.checked_at.cmp(&a.checked_at));
            let items: Vec<TimelineItem> = series.into_iter().map(TimelineItem::from).collect();
            let latest = items.first()?.clone();
            Some(ProviderTimeline { id, items, latest })
        })
        .collect();

    timelines.sort_by(|a, b| {
        compare_names(&a.latest.result.name, &b.latest.result.name).then_with(|| a.id.cmp(&b.id))
    });

    let last_updated_at = timelines
        .iter()
        .map(|t| t.latest.result.checked_at)
        .max();

    DashboardData {
        last_updated: last_updated_at.as_ref().map(format_time),
        last_updated_at,
        total: timelines.len(),
        provider_timelines: timelines,
        poll_interval_label: polling.label(),
        poll_interval_ms: polling.interval_ms(),
    }
}
