//! ロギング初期化
//!
//! `CHECK_LOG_LEVEL`（旧: `RUST_LOG`）でフィルタを決め、`CHECK_LOG_DIR`が設定されていれば
//! 日次ローテーションのファイルにも出力する。

use crate::config::get_env_with_fallback;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// デフォルトのログレベル
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// ログファイル名のプレフィックス
const LOG_FILE_PREFIX: &str = "check-cx.log";

/// 環境変数からフィルタを構築
pub fn env_filter() -> EnvFilter {
    let directives = get_env_with_fallback("CHECK_LOG_LEVEL", "RUST_LOG")
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// グローバルsubscriberを設定する
///
/// ファイル出力を有効にした場合、返されたガードはプロセス終了まで保持すること。
pub fn init() -> anyhow::Result<Option<WorkerGuard>> {
    let stdout_layer = fmt::layer().with_target(false);

    let (file_layer, guard) = match get_env_with_fallback("CHECK_LOG_DIR", "CHECK_LOG_PATH") {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter())
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
