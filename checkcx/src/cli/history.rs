//! history サブコマンド
//!
//! 保存済みのタイムラインを表示する。

use super::check::format_latency;
use crate::dashboard::{DashboardData, DashboardService, RefreshMode};
use clap::Args;

/// history サブコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Refresh mode: always | missing | never
    #[arg(long, default_value = "never")]
    pub refresh: RefreshMode,

    /// Print the dashboard payload as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// history を実行
pub async fn execute(args: &HistoryArgs, service: &DashboardService) -> anyhow::Result<()> {
    let data = service.load_dashboard_data(args.refresh).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        print_summary(&data);
    }
    Ok(())
}

fn print_summary(data: &DashboardData) {
    println!(
        "Providers: {}  Last updated: {}  Poll interval: {}",
        data.total,
        data.last_updated.as_deref().unwrap_or("-"),
        data.poll_interval_label
    );
    println!("NAME\tSTATUS\tLATENCY\tCHECKED\tPOINTS");
    for timeline in &data.provider_timelines {
        let latest = &timeline.latest;
        println!(
            "{}\t{}\t{}\t{}\t{}",
            latest.result.name,
            latest.result.status,
            format_latency(latest.result.latency_ms),
            latest.formatted_time,
            timeline.items.len()
        );
    }
}
