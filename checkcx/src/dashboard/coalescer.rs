//! ポーリングキャッシュ（single-flight）
//!
//! 同じプロバイダ集合・同じポーリング間隔のリクエストは1つのキャッシュエントリを共有する。
//! 間隔内の再読み込みはキャッシュを返し、実行中のプローブがあればそれに相乗りする。

use crate::types::HistoryMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

type InflightProbe = Shared<BoxFuture<'static, HistoryMap>>;

/// キャッシュキーを作る（`<ms>:<ソート済みID|区切り>`、空集合は`<ms>:__empty__`）
pub fn cache_key<'a, I>(provider_ids: I, interval_ms: u64) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let ids: BTreeSet<&str> = provider_ids.into_iter().collect();
    if ids.is_empty() {
        format!("{}:__empty__", interval_ms)
    } else {
        let joined: Vec<&str> = ids.into_iter().collect();
        format!("{}:{}", interval_ms, joined.join("|"))
    }
}

#[derive(Default)]
struct PollCacheEntry {
    last_probe_at: Option<Instant>,
    last_series: Option<HistoryMap>,
    inflight: Option<InflightProbe>,
}

impl PollCacheEntry {
    fn fresh_series(&self, interval: Duration) -> Option<&HistoryMap> {
        match (self.last_probe_at, &self.last_series) {
            (Some(at), Some(series)) if at.elapsed() < interval => Some(series),
            _ => None,
        }
    }
}

/// ポーリングキャッシュ
///
/// エントリは遅延作成され、コアレッサの生存期間中保持される。
#[derive(Default)]
pub struct PollCoalescer {
    entries: Mutex<HashMap<String, Arc<Mutex<PollCacheEntry>>>>,
}

impl PollCoalescer {
    /// 空のキャッシュを作成
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, key: &str) -> Arc<Mutex<PollCacheEntry>> {
        let mut entries = self.entries.lock().await;
        Arc::clone(entries.entry(key.to_string()).or_default())
    }

    /// キャッシュ済みの履歴を返すか、プローブを（多くても1つだけ）実行する
    ///
    /// `probe`は新しいプローブを開始する場合にのみ呼ばれる。完了時の更新は
    /// 共有futureの中で1回だけ行われ、相乗りした呼び出し元は同じ結果を受け取る。
    pub async fn refresh<F, Fut>(&self, key: &str, interval: Duration, probe: F) -> HistoryMap
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = HistoryMap> + Send + 'static,
    {
        let entry = self.entry(key).await;

        let inflight = {
            let mut guard = entry.lock().await;
            if let Some(series) = guard.fresh_series(interval) {
                debug!(key, "Serving cached probe result");
                return series.clone();
            }

            if let Some(inflight) = guard.inflight.clone() {
                debug!(key, "Joining in-flight probe");
                inflight
            } else {
                debug!(key, "Starting probe");
                let completion_entry = Arc::clone(&entry);
                let probe = probe();
                let shared = async move {
                    let series = probe.await;
                    let mut guard = completion_entry.lock().await;
                    guard.last_series = Some(series.clone());
                    guard.last_probe_at = Some(Instant::now());
                    guard.inflight = None;
                    series
                }
                .boxed()
                .shared();
                guard.inflight = Some(shared.clone());
                shared
            }
        };

        inflight.await
    }
}
