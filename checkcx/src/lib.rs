//! check-cx Server
//!
//! 生成AIプロバイダのエンドポイントへ定期的にpingを送り、稼働状況と履歴を提供する

#![warn(missing_docs)]

/// 共通型定義（エラー型）
pub mod common;

/// REST APIハンドラー
pub mod api;

/// CLIインターフェース
pub mod cli;

/// 設定管理（環境変数ヘルパー、プロバイダ設定）
pub mod config;

/// ダッシュボード読み出し（ポーリングキャッシュ含む）
pub mod dashboard;

/// データベースアクセス
pub mod db;

/// ヘルスチェック（分類器、プロトコルアダプタ、プローブ実行）
pub mod health;

/// ロギング初期化ユーティリティ
pub mod logging;

/// 型定義
pub mod types;

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    /// ダッシュボードサービス（プローブ・履歴・キャッシュを保持）
    pub dashboard: std::sync::Arc<dashboard::DashboardService>,
}
