//! 型定義モジュール
//!
//! プロバイダ設定とチェック結果の型

/// プロバイダ設定型
pub mod provider;

/// チェック結果型
pub mod check;

pub use check::{CheckResult, HealthStatus, HistoryMap};
pub use provider::{mask_key, ProviderConfig, ProviderType};
