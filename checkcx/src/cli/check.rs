//! check サブコマンド
//!
//! 全プロバイダを1回だけプローブして結果を表示する。

use crate::common::error::CxError;
use crate::config::load_provider_configs;
use crate::db::{self, check_history::HistoryStore};
use crate::health::{run_provider_checks, ProbeRunner};
use crate::types::{CheckResult, HealthStatus};
use clap::Args;
use tracing::warn;

/// check サブコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Do not write results to the history store
    #[arg(long, default_value_t = false)]
    pub no_store: bool,

    /// Print results as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// check を実行
///
/// 1件でも`failed`があれば終了コード用に`false`を返す。
pub async fn execute(args: &CheckArgs, database_url: &str) -> anyhow::Result<bool> {
    let configs = load_provider_configs();
    if configs.is_empty() {
        return Err(CxError::Config("no providers configured (set CHECK_GROUPS)".into()).into());
    }

    let store = open_store(database_url, args.no_store).await;
    let results = run_provider_checks(&ProbeRunner::default(), &configs).await;

    if let Some(store) = store {
        store.append(&results).await;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_table(&results);
    }

    Ok(results.iter().all(|r| r.status != HealthStatus::Failed))
}

/// 履歴ストアを開く。開けない場合は警告して保存をスキップする
pub async fn open_store(database_url: &str, no_store: bool) -> Option<HistoryStore> {
    if no_store {
        return None;
    }
    match db::init_pool(database_url).await {
        Ok(pool) => Some(HistoryStore::sqlite(pool)),
        Err(e) => {
            warn!(error = %e, "History store unavailable, results will not be saved");
            None
        }
    }
}

fn print_table(results: &[CheckResult]) {
    println!("NAME\tTYPE\tSTATUS\tLATENCY\tMESSAGE");
    for result in results {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            result.name,
            result.provider_type,
            result.status,
            format_latency(result.latency_ms),
            result.message
        );
    }
}

/// レイテンシの表示
pub fn format_latency(latency_ms: Option<u64>) -> String {
    match latency_ms {
        Some(ms) => format!("{}ms", ms),
        None => "-".to_string(),
    }
}
