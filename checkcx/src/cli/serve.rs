//! serve サブコマンド
//!
//! ダッシュボードAPIを起動し、ポーリング間隔ごとにバックグラウンドでプローブする。

use crate::config::{get_env_with_fallback_or, get_env_with_fallback_parse};
use crate::dashboard::{DashboardService, RefreshMode};
use crate::{api, AppState};
use clap::Args;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// デフォルトのポート
pub const DEFAULT_PORT: u16 = 3000;

/// serve サブコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Listen port
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "CHECK_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "CHECK_HOST")]
    pub host: String,

    /// Do not probe in the background; only probe when the dashboard is read
    #[arg(long, default_value_t = false)]
    pub no_poller: bool,
}

impl ServeArgs {
    /// サブコマンド省略時に環境変数から構築
    pub fn from_env() -> Self {
        Self {
            port: get_env_with_fallback_parse("CHECK_PORT", "PORT", DEFAULT_PORT),
            host: get_env_with_fallback_or("CHECK_HOST", "HOST", "0.0.0.0"),
            no_poller: false,
        }
    }

    /// バインドアドレス
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// ポーリング間隔ごとに`always`モードで読み出し、閲覧者がいなくても履歴を蓄積する
///
/// ページ読み込みとの競合はポーリングキャッシュが吸収する。
pub fn spawn_background_poller(service: Arc<DashboardService>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(service.polling().interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            let data = service.load_dashboard_data(RefreshMode::Always).await;
            debug!(timelines = data.total, "Background poll completed");
        }
    })
}

/// serve を実行
pub async fn execute(args: &ServeArgs, service: DashboardService) -> anyhow::Result<()> {
    let service = Arc::new(service);
    let poller = if args.no_poller || service.configs().is_empty() {
        None
    } else {
        info!(interval = %service.polling().label(), "Starting background poller");
        Some(spawn_background_poller(Arc::clone(&service)))
    };

    let app = api::create_router(AppState { dashboard: service });
    let listener = tokio::net::TcpListener::bind(args.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "check-cx server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(poller) = poller {
        poller.abort();
    }
    info!("check-cx server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
