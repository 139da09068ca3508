//! 全プロバイダの並列プローブ

use super::probe::ProbeRunner;
use crate::types::{CheckResult, HealthStatus, ProviderConfig};
use futures::future::join_all;
use std::cmp::Ordering;
use tracing::info;

/// 設定された全プロバイダを並列にプローブする
///
/// 個々の失敗でバッチを中断しない。結果は表示名の昇順で返す。
/// 設定が空ならネットワークアクセスなしで空を返す。
pub async fn run_provider_checks(
    runner: &ProbeRunner,
    configs: &[ProviderConfig],
) -> Vec<CheckResult> {
    if configs.is_empty() {
        info!("No providers to check");
        return Vec::new();
    }

    info!(count = configs.len(), "Starting parallel provider checks");

    let mut results = join_all(configs.iter().map(|config| runner.probe(config))).await;
    results.sort_by(compare_by_name);

    let failed = results
        .iter()
        .filter(|r| r.status == HealthStatus::Failed)
        .count();
    info!(
        success = results.len() - failed,
        failure = failed,
        "Parallel provider checks completed"
    );

    results
}

/// 表示名順（大文字小文字を無視 → 完全一致 → ID）
pub fn compare_by_name(a: &CheckResult, b: &CheckResult) -> Ordering {
    compare_names(&a.name, &b.name).then_with(|| a.provider_id.cmp(&b.provider_id))
}

/// 表示名の比較
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
