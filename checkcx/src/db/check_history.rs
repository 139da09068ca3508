//! チェック履歴のストレージ層
//!
//! プローブ結果を不変レコードとして保存し、保持期間（1時間）外のレコードを掃除する。
//! 読み出しはプロバイダごとに新しい順・最大60件。
//!
//! ストレージ障害はログに記録して空の結果として扱い、呼び出し元には返さない。

use crate::common::error::{CxError, CxResult};
use crate::types::{CheckResult, HistoryMap};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// 履歴の保持期間（秒）
pub const HISTORY_WINDOW_SECS: i64 = 60 * 60;

/// プロバイダごとの最大件数（おおよそ1分に1点）
pub const MAX_POINTS_PER_PROVIDER: usize = 60;

/// 1回の読み出しで取得する最大行数の倍率
const FETCH_LIMIT_FACTOR: usize = 10;

/// 永続ストアの操作
///
/// 挿入と削除はどちらも冪等に近く、複数プロセスからの同時利用で
/// 時間窓の見え方が壊れないこと。
#[async_trait]
pub trait CheckHistoryRepository: Send + Sync {
    /// 複数レコードを挿入し、挿入件数を返す
    async fn insert_many(&self, results: &[CheckResult]) -> CxResult<u64>;

    /// `checked_at >= cutoff` のレコードを新しい順に最大`limit`件返す
    async fn list_since(&self, cutoff: DateTime<Utc>, limit: i64) -> CxResult<Vec<CheckResult>>;

    /// `checked_at < cutoff` のレコードを削除し、削除件数を返す
    async fn delete_before(&self, cutoff: DateTime<Utc>) -> CxResult<u64>;
}

/// チェック履歴リポジトリ（SQLite版）
#[derive(Clone)]
pub struct SqliteCheckHistory {
    pool: SqlitePool,
}

impl SqliteCheckHistory {
    /// 新しいリポジトリを作成
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// 辞書順比較で時刻順になるよう固定幅で書き出す
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

#[async_trait]
impl CheckHistoryRepository for SqliteCheckHistory {
    async fn insert_many(&self, results: &[CheckResult]) -> CxResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for result in results {
            let done = sqlx::query(
                r#"
                INSERT INTO check_history (
                    provider_id, provider_name, provider_type, endpoint, model,
                    status, latency_ms, checked_at, message
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&result.provider_id)
            .bind(&result.name)
            .bind(result.provider_type.as_str())
            .bind(&result.endpoint)
            .bind(&result.model)
            .bind(result.status.as_str())
            .bind(result.latency_ms.map(|v| v as i64))
            .bind(format_timestamp(&result.checked_at))
            .bind(&result.message)
            .execute(&mut *tx)
            .await?;
            inserted += done.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn list_since(&self, cutoff: DateTime<Utc>, limit: i64) -> CxResult<Vec<CheckResult>> {
        let rows = sqlx::query_as::<_, CheckHistoryRow>(
            r#"
            SELECT provider_id, provider_name, provider_type, endpoint, model,
                   status, latency_ms, checked_at, message
            FROM check_history
            WHERE checked_at >= ?
            ORDER BY checked_at DESC
            LIMIT ?
            "#,
        )
        .bind(format_timestamp(&cutoff))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            match CheckResult::try_from(row) {
                Ok(result) => results.push(result),
                Err(e) => warn!(error = %e, "Skipping malformed check history row"),
            }
        }
        Ok(results)
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> CxResult<u64> {
        let done = sqlx::query("DELETE FROM check_history WHERE checked_at < ?")
            .bind(format_timestamp(&cutoff))
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }
}

#[derive(sqlx::FromRow)]
struct CheckHistoryRow {
    provider_id: String,
    provider_name: String,
    provider_type: String,
    endpoint: String,
    model: String,
    status: String,
    latency_ms: Option<i64>,
    checked_at: String,
    message: String,
}

impl TryFrom<CheckHistoryRow> for CheckResult {
    type Error = CxError;

    fn try_from(row: CheckHistoryRow) -> Result<Self, Self::Error> {
        let provider_type = row
            .provider_type
            .parse()
            .map_err(|_| CxError::Storage(format!("invalid provider_type {}", row.provider_type)))?;
        let status = row.status.parse().map_err(CxError::Storage)?;
        let checked_at = DateTime::parse_from_rfc3339(&row.checked_at)
            .map_err(|e| CxError::Storage(format!("invalid checked_at {}: {}", row.checked_at, e)))?
            .with_timezone(&Utc);

        Ok(CheckResult {
            provider_id: row.provider_id,
            name: row.provider_name,
            provider_type,
            endpoint: row.endpoint,
            model: row.model,
            status,
            latency_ms: row.latency_ms.and_then(|v| u64::try_from(v).ok()),
            checked_at,
            message: row.message,
        })
    }
}

/// 履歴ストアアダプタ
///
/// 追記と読み出しの両方とも失敗を投げない。ストア障害は「履歴なし」として見える。
#[derive(Clone)]
pub struct HistoryStore {
    repo: Arc<dyn CheckHistoryRepository>,
    window: Duration,
    max_points: usize,
}

impl HistoryStore {
    /// 任意のリポジトリから作成
    pub fn new(repo: Arc<dyn CheckHistoryRepository>) -> Self {
        Self {
            repo,
            window: Duration::seconds(HISTORY_WINDOW_SECS),
            max_points: MAX_POINTS_PER_PROVIDER,
        }
    }

    /// SQLiteプールから作成
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self::new(Arc::new(SqliteCheckHistory::new(pool)))
    }

    /// 保持期間を設定
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// プロバイダごとの最大件数を設定
    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }

    /// 結果を追記し、期限切れを掃除してから最新の履歴を返す
    pub async fn append(&self, results: &[CheckResult]) -> HistoryMap {
        if results.is_empty() {
            return self.load().await;
        }

        match self.repo.insert_many(results).await {
            Ok(inserted) => debug!(inserted, "Check history appended"),
            Err(e) => error!(error = %e, "Failed to write check history"),
        }

        // 掃除は失敗しても挿入を無効にしない
        let cutoff = Utc::now() - self.window;
        match self.repo.delete_before(cutoff).await {
            Ok(deleted) if deleted > 0 => debug!(deleted, "Expired check history removed"),
            Ok(_) => {}
            Err(e) => error!(error = %e, "Failed to cleanup expired check history"),
        }

        self.load().await
    }

    /// 保持期間内の履歴をプロバイダごとに返す
    pub async fn load(&self) -> HistoryMap {
        let now = Utc::now();
        let cutoff = now - self.window;
        let limit = (self.max_points * FETCH_LIMIT_FACTOR) as i64;

        match self.repo.list_since(cutoff, limit).await {
            Ok(records) => build_history_map(records, cutoff, self.max_points),
            Err(e) => {
                error!(error = %e, "Failed to load check history");
                HistoryMap::new()
            }
        }
    }
}

/// レコードをプロバイダごとにまとめ、時間窓・並び順・上限を適用する
pub fn build_history_map(
    records: Vec<CheckResult>,
    cutoff: DateTime<Utc>,
    max_points: usize,
) -> HistoryMap {
    let mut history = HistoryMap::new();
    for record in records.into_iter().filter(|r| r.checked_at >= cutoff) {
        history
            .entry(record.provider_id.clone())
            .or_default()
            .push(record);
    }

    for series in history.values_mut() {
        series.sort_by(|a, b| b.checked_at.cmp(&a.checked_at));
        series.truncate(max_points);
    }
    history.retain(|_, series| !series.is_empty());
    history
}
