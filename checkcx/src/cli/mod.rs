//! CLI module for check-cx
//!
//! サーバー起動・単発チェック・履歴表示のサブコマンドを提供する。

pub mod check;
pub mod history;
pub mod serve;

use crate::config::{load_provider_configs, PollingConfig};
use crate::dashboard::DashboardService;
use crate::db::{self, check_history::HistoryStore, DEFAULT_DATABASE_URL};
use crate::health::ProbeRunner;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

/// check-cx - Health dashboard for generative AI provider endpoints
#[derive(Parser, Debug)]
#[command(name = "check-cx")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    CHECK_GROUPS                Comma-separated provider ids (e.g. main,backup)
    CHECK_<ID>_TYPE             openai | gemini | anthropic
    CHECK_<ID>_KEY              API key
    CHECK_<ID>_MODEL            Model name
    CHECK_<ID>_ENDPOINT         Endpoint URL (default per type)
    CHECK_<ID>_NAME             Display name (default: id)
    CHECK_POLL_INTERVAL_SECS    Poll interval, 15-600 (default: 60)
    CHECK_HOST                  Bind address (default: 0.0.0.0)
    CHECK_PORT                  Listen port (default: 3000)
    CHECK_DATABASE_URL          Database URL (default: sqlite:data/check-cx.db)
    CHECK_LOG_LEVEL             Log level (default: info)
    CHECK_LOG_DIR               Write daily rolling log files here
"#)]
pub struct Cli {
    /// SQLite database URL
    #[arg(long, global = true, env = "CHECK_DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Subcommand to execute (default: serve)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the dashboard server with the background poller
    Serve(serve::ServeArgs),
    /// Probe every configured provider once and print the results
    Check(check::CheckArgs),
    /// Print the stored dashboard timelines
    History(history::HistoryArgs),
}

/// 環境変数の設定からダッシュボードサービスを組み立てる
pub async fn build_dashboard_service(database_url: &str) -> anyhow::Result<DashboardService> {
    let configs = load_provider_configs();
    if configs.is_empty() {
        warn!("No providers configured; set CHECK_GROUPS to enable probing");
    }
    let polling = PollingConfig::from_env();
    let pool = db::init_pool(database_url).await?;

    info!(
        providers = configs.len(),
        poll_interval = %polling.label(),
        "Dashboard service initialized"
    );

    Ok(DashboardService::new(
        configs,
        ProbeRunner::default(),
        HistoryStore::sqlite(pool),
        polling,
    ))
}
